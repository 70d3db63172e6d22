use crate::{
    backend::{fourcc_literal, write_doc_block, write_line_comments, Backend, Output},
    document::Document,
    error::NidlError,
    idltypes,
    protocol::{argument_types, parameter_list},
    types::{AggregateDecl, EnumDecl, MessageDecl, Model},
};

/// The C++ header: attribute declarations, enums, aggregate structs with
/// their `Traits`, and message dispatch declarations.
#[derive(Debug, Clone)]
pub struct CppHeader {
    pub version: u32,
}

impl Backend for CppHeader {
    fn name(&self) -> &'static str {
        "header"
    }

    fn emit(&self, document: &Document, model: &Model, out: &mut Output<'_>) -> Result<(), NidlError> {
        document.write_include_header(out, self.version, true)?;
        document.write_includes(out, &header_includes(model))?;
        out.write_line("")?;

        if !model.attributes.is_empty() {
            out.write_line(crate::filewriter::DIVIDER)?;
            document.begin_namespace_override(out, "Attr")?;
            for attribute in &model.attributes {
                write_attribute_declaration(out, attribute)?;
            }
            document.end_namespace_override(out, "Attr")?;
            out.write_line("")?;
        }

        out.write_line(crate::filewriter::DIVIDER)?;
        document.begin_namespace(out)?;
        out.write_line("")?;

        if !model.enums.is_empty() {
            out.write_boxed_comment("Enums")?;
            for decl in &model.enums {
                write_enum(out, decl)?;
            }
        }
        for aggregate in &model.aggregates {
            write_struct(out, aggregate)?;
        }
        for aggregate in &model.aggregates {
            write_traits(out, &model.namespace, aggregate)?;
        }
        for message in &model.messages {
            write_message(out, message)?;
        }

        document.end_namespace(out)?;
        Ok(())
    }
}

fn header_includes(model: &Model) -> Vec<String> {
    let mut includes = vec!["core/types.h".to_string()];
    if model.contains_entity_types() {
        includes.push("game/entity.h".to_string());
    }
    if model.contains_resource_types() {
        includes.push("resources/resourceid.h".to_string());
    }
    if !model.attributes.is_empty() {
        includes.push("game/attr/attrid.h".to_string());
    }
    if !model.messages.is_empty() {
        includes.push("util/delegate.h".to_string());
        includes.push("util/array.h".to_string());
    }
    includes.extend(model.includes.iter().cloned());
    includes
}

fn write_attribute_declaration(out: &mut Output<'_>, attribute: &AggregateDecl) -> Result<(), NidlError> {
    for field in &attribute.fields {
        out.write_line(&format!(
            "Declare{}({}, {}, {});",
            idltypes::camel_notation(field.ty.token()),
            field.name,
            fourcc_literal(attribute.fourcc.as_deref()),
            field.access.as_cpp()
        ))?;
    }
    Ok(())
}

pub(crate) fn write_enum(out: &mut Output<'_>, decl: &EnumDecl) -> Result<(), NidlError> {
    out.write_line(&format!("enum {}", decl.name))?;
    out.write_line("{")?;
    out.increase_indent();
    for (key, value) in &decl.entries {
        out.write_line(&format!("{} = {},", key, value))?;
    }
    out.write_line(&format!("{} = {}", decl.sentinel(), decl.count()))?;
    out.decrease_indent();
    out.write_line("};")?;
    out.write_line("")?;
    Ok(())
}

fn write_struct(out: &mut Output<'_>, aggregate: &AggregateDecl) -> Result<(), NidlError> {
    write_doc_block(out, aggregate.description.as_deref())?;
    out.write_line(&format!("struct {}", aggregate.name))?;
    out.write_line("{")?;
    out.increase_indent();
    for field in &aggregate.fields {
        if let Some(ref description) = field.description {
            write_line_comments(out, description)?;
        }
        out.write_line(&format!("{} {} = {};", field.native_type(), field.name, field.default_value))?;
    }
    out.write_line("struct Traits;")?;
    out.decrease_indent();
    out.write_line("};")?;
    out.write_line("")?;
    Ok(())
}

fn write_traits(out: &mut Output<'_>, namespace: &str, aggregate: &AggregateDecl) -> Result<(), NidlError> {
    let name = &aggregate.name;
    out.write_divider()?;
    out.write_line(&format!("struct {}::Traits", name))?;
    out.write_line("{")?;
    out.increase_indent();
    out.write_line(&format!("static_assert(std::is_standard_layout<{}>());", name))?;
    out.write_line("Traits() = delete;")?;
    out.write_line(&format!("using type = {};", name))?;
    out.write_line(&format!("static constexpr auto name = \"{}\";", name))?;
    out.write_line(&format!(
        "static constexpr auto fully_qualified_name = \"{}.{}\";",
        namespace.replace("::", "."),
        name
    ))?;
    out.write_line(&format!(
        "static constexpr uint fourcc = {};",
        fourcc_literal(aggregate.fourcc.as_deref())
    ))?;
    out.write_line(&format!("static constexpr bool is_flag = {};", aggregate.is_flag_marker))?;
    out.write_line(&format!("static constexpr size_t num_fields = {};", aggregate.fields.len()))?;

    if aggregate.fields.is_empty() {
        out.write_line("static constexpr const char** field_names = nullptr;")?;
        out.write_line("static constexpr size_t* field_byte_offsets = nullptr;")?;
    } else {
        out.write_line("static constexpr const char* field_names[num_fields] = {")?;
        for field in &aggregate.fields {
            out.write_line(&format!("    \"{}\",", field.name))?;
        }
        out.write_line("};")?;

        out.write_line("using field_types = std::tuple<")?;
        let last = aggregate.fields.len() - 1;
        for (i, field) in aggregate.fields.iter().enumerate() {
            out.write(&format!("    {}", field.native_type()))?;
            out.write_line(if i < last { "," } else { "" })?;
        }
        out.write_line(">;")?;

        out.write_line("static constexpr size_t field_byte_offsets[num_fields] = {")?;
        for field in &aggregate.fields {
            out.write_line(&format!("    offsetof({}, {}),", name, field.name))?;
        }
        out.write_line("};")?;
    }
    out.decrease_indent();
    out.write_line("};")?;
    out.write_line("")?;
    Ok(())
}

fn write_message(out: &mut Output<'_>, message: &MessageDecl) -> Result<(), NidlError> {
    write_doc_block(out, message.description.as_deref())?;
    out.write_line(&format!("struct {}", message.name))?;
    out.write_line("{")?;
    out.increase_indent();
    out.write_line(&format!("{}() = delete;", message.name))?;
    out.write_line(&format!("using Delegate = Util::Delegate<void({})>;", argument_types(message)))?;
    out.write_line(&format!("static constexpr uint fourcc = '{}';", message.fourcc))?;
    out.write_line(&format!("static constexpr auto name = \"{}\";", message.name))?;
    out.write_line(&format!("static constexpr size_t num_args = {};", message.args.len()))?;
    out.write_line("/// Invoke every subscriber in registration order")?;
    out.write_line(&format!("static void Send({});", parameter_list(message)))?;
    out.write_line("/// Send with positional arguments from a script binding")?;
    out.write_line("static void SendDynamic(Util::Array<Util::Variant> const& args);")?;
    out.write_line("static void Subscribe(Delegate const& delegate);")?;
    out.write_line("static void Unsubscribe(Delegate const& delegate);")?;
    out.decrease_indent();
    out.write_line("private:")?;
    out.increase_indent();
    out.write_line("static Util::Array<Delegate>& Subscribers();")?;
    out.decrease_indent();
    out.write_line("};")?;
    out.write_line("")?;
    Ok(())
}
