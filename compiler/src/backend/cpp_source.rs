use crate::{
    backend::{fourcc_literal, write_doc_block, Backend, Output},
    document::Document,
    error::NidlError,
    filewriter::DIVIDER,
    idltypes,
    protocol::{argument_names, parameter_list},
    types::{AggregateDecl, EnumDecl, MessageDecl, Model, TypeRef},
    utils::quote,
};

/// The C++ source: attribute definitions, message dispatch, static type
/// registration, script bindings and JSON serializers.
#[derive(Debug, Clone)]
pub struct CppSource {
    pub version:     u32,
    /// How the generated header is named in `#include`.
    pub header_name: String,
}

impl Backend for CppSource {
    fn name(&self) -> &'static str {
        "source"
    }

    fn emit(&self, document: &Document, model: &Model, out: &mut Output<'_>) -> Result<(), NidlError> {
        document.write_include_header(out, self.version, false)?;
        document.write_includes(out, &self.includes(model))?;
        out.write_line("")?;

        if !model.attributes.is_empty() {
            out.write_line(DIVIDER)?;
            document.begin_namespace_override(out, "Attr")?;
            for attribute in &model.attributes {
                for field in &attribute.fields {
                    out.write_line(&format!(
                        "Define{}WithDefault({}, {}, {}, {});",
                        idltypes::camel_notation(field.ty.token()),
                        field.name,
                        fourcc_literal(attribute.fourcc.as_deref()),
                        field.access.as_cpp(),
                        field.default_value
                    ))?;
                }
            }
            document.end_namespace_override(out, "Attr")?;
            out.write_line("")?;
        }

        out.write_line(DIVIDER)?;
        document.begin_namespace(out)?;
        out.write_line("")?;
        for message in &model.messages {
            write_message_impl(out, message)?;
        }
        if !model.aggregates.is_empty() || model.exported_messages().next().is_some() {
            document.begin_namespace_override(out, "Details")?;
            write_registration(out, model)?;
            write_message_bindings(out, model)?;
            document.end_namespace_override(out, "Details")?;
            out.write_line("")?;
        }
        document.end_namespace(out)?;

        if model.needs_serializers() {
            out.write_line("")?;
            out.write_line(DIVIDER)?;
            document.begin_namespace_override(out, "IO")?;
            for decl in &model.enums {
                write_enum_serializers(out, &model.namespace, decl)?;
            }
            for aggregate in model.aggregates.iter().filter(|a| a.is_struct_shaped()) {
                write_struct_serializers(out, &model.namespace, aggregate)?;
                if aggregate.allow_array {
                    write_array_serializers(out, &model.namespace, aggregate)?;
                }
            }
            document.end_namespace_override(out, "IO")?;
        }
        Ok(())
    }
}

impl CppSource {
    fn includes(&self, model: &Model) -> Vec<String> {
        let mut includes = vec!["foundation/stdneb.h".to_string(), self.header_name.clone()];
        if !model.aggregates.is_empty() {
            includes.push("game/typeregistry.h".to_string());
        }
        if model.exported_messages().next().is_some() {
            includes.push("scripting/messagebindings.h".to_string());
        }
        if model.needs_serializers() {
            includes.push("io/jsonreader.h".to_string());
            includes.push("io/jsonwriter.h".to_string());
            includes.push("pjson/pjson.h".to_string());
        }
        includes
    }
}

/// A type spelled so that it resolves outside the document namespace.
fn qualified(namespace: &str, ty: &TypeRef) -> String {
    match *ty {
        TypeRef::Enum(ref name) | TypeRef::Aggregate(ref name) => format!("{}::{}", namespace, name),
        ref other => other.native(),
    }
}

fn write_message_impl(out: &mut Output<'_>, message: &MessageDecl) -> Result<(), NidlError> {
    let name = &message.name;

    out.write_divider()?;
    out.write_line("void")?;
    out.write_line(&format!("{}::Send({})", name, parameter_list(message)))?;
    out.write_line("{")?;
    out.increase_indent();
    out.write_line("Util::Array<Delegate> const& subscribers = Subscribers();")?;
    out.write_line("for (IndexT i = 0; i < subscribers.Size(); i++)")?;
    out.write_line("{")?;
    out.increase_indent();
    out.write_line(&format!("subscribers[i]({});", argument_names(message)))?;
    out.decrease_indent();
    out.write_line("}")?;
    out.decrease_indent();
    out.write_line("}")?;
    out.write_line("")?;

    out.write_divider()?;
    out.write_line("void")?;
    out.write_line(&format!("{}::SendDynamic(Util::Array<Util::Variant> const& args)", name))?;
    out.write_line("{")?;
    out.increase_indent();
    out.write_line(&format!("n_assert(args.Size() == {});", message.args.len()))?;
    let forwarded: Vec<String> = message
        .args
        .iter()
        .enumerate()
        .map(|(i, arg)| match arg.ty {
            TypeRef::Enum(ref enum_name) => format!("static_cast<{}>(args[{}].Get<int>())", enum_name, i),
            ref other => format!("args[{}].Get<{}>()", i, other.native()),
        })
        .collect();
    out.write_line(&format!("Send({});", forwarded.join(", ")))?;
    out.decrease_indent();
    out.write_line("}")?;
    out.write_line("")?;

    out.write_divider()?;
    out.write_line("void")?;
    out.write_line(&format!("{}::Subscribe(Delegate const& delegate)", name))?;
    out.write_line("{")?;
    out.increase_indent();
    out.write_line("Subscribers().Append(delegate);")?;
    out.decrease_indent();
    out.write_line("}")?;
    out.write_line("")?;

    out.write_divider()?;
    out.write_line("void")?;
    out.write_line(&format!("{}::Unsubscribe(Delegate const& delegate)", name))?;
    out.write_line("{")?;
    out.increase_indent();
    out.write_line("IndexT index = Subscribers().FindIndex(delegate);")?;
    out.write_line("if (index != InvalidIndex)")?;
    out.write_line("{")?;
    out.increase_indent();
    out.write_line("Subscribers().EraseIndex(index);")?;
    out.decrease_indent();
    out.write_line("}")?;
    out.decrease_indent();
    out.write_line("}")?;
    out.write_line("")?;

    out.write_divider()?;
    out.write_line(&format!("Util::Array<{}::Delegate>&", name))?;
    out.write_line(&format!("{}::Subscribers()", name))?;
    out.write_line("{")?;
    out.increase_indent();
    out.write_line("static Util::Array<Delegate> subscribers;")?;
    out.write_line("return subscribers;")?;
    out.decrease_indent();
    out.write_line("}")?;
    out.write_line("")?;
    Ok(())
}

fn write_registration(out: &mut Output<'_>, model: &Model) -> Result<(), NidlError> {
    if model.aggregates.is_empty() {
        return Ok(());
    }
    write_doc_block(out, Some("Registers every type of this file with the type registry."))?;
    out.write_line("static bool")?;
    out.write_line("RegisterTypes()")?;
    out.write_line("{")?;
    out.increase_indent();
    for aggregate in &model.aggregates {
        let name = &aggregate.name;
        out.write_line(&format!(
            "Game::TypeRegistry::Register<{name}>({quoted}, {name}(), {name}::Traits::num_fields, {name}::Traits::field_names, {name}::Traits::field_byte_offsets);",
            name = name,
            quoted = quote(name)
        ))?;
    }
    out.write_line("return true;")?;
    out.decrease_indent();
    out.write_line("}")?;
    out.write_line("static const bool typesRegistered = RegisterTypes();")?;
    out.write_line("")?;
    Ok(())
}

fn write_message_bindings(out: &mut Output<'_>, model: &Model) -> Result<(), NidlError> {
    let mut exported = model.exported_messages().peekable();
    if exported.peek().is_none() {
        return Ok(());
    }
    write_doc_block(out, Some("Script bindings for exported messages, keyed by name."))?;
    out.write_line("static bool")?;
    out.write_line("RegisterMessageBindings()")?;
    out.write_line("{")?;
    out.increase_indent();
    for message in exported {
        out.write_line(&format!(
            "Scripting::MessageBindings::Register({}, '{}', &{}::SendDynamic, {});",
            quote(&message.name),
            message.fourcc,
            message.name,
            message.args.len()
        ))?;
    }
    out.write_line("return true;")?;
    out.decrease_indent();
    out.write_line("}")?;
    out.write_line("static const bool messagesRegistered = RegisterMessageBindings();")?;
    Ok(())
}

fn write_enum_serializers(out: &mut Output<'_>, namespace: &str, decl: &EnumDecl) -> Result<(), NidlError> {
    let ty = format!("{}::{}", namespace, decl.name);

    out.write_divider()?;
    out.write_line(&format!("template<> void JsonReader::Get<{ty}>({ty}& ret, const char* attr)", ty = ty))?;
    out.write_line("{")?;
    out.increase_indent();
    out.write_line("const pjson::value_variant* node = this->GetChild(attr);")?;
    out.write_line("if (node->is_string())")?;
    out.write_line("{")?;
    out.increase_indent();
    out.write_line("Util::String str = node->as_string_ptr();")?;
    for (key, _) in &decl.entries {
        out.write_line(&format!("if (str == \"{key}\") {{ ret = {ty}::{key}; return; }}", key = key, ty = ty))?;
    }
    out.decrease_indent();
    out.write_line("}")?;
    out.write_line("else if (node->is_int())")?;
    out.write_line("{")?;
    out.increase_indent();
    out.write_line(&format!("ret = ({})node->as_int32();", ty))?;
    out.write_line("return;")?;
    out.decrease_indent();
    out.write_line("}")?;
    out.write_line(&format!("ret = {}();", ty))?;
    out.decrease_indent();
    out.write_line("}")?;
    out.write_line("")?;

    out.write_divider()?;
    out.write_line(&format!(
        "template<> void JsonWriter::Add<{ty}>({ty} const& value, Util::String const& attr)",
        ty = ty
    ))?;
    out.write_line("{")?;
    out.increase_indent();
    out.write_line("this->Add<int>(value, attr);")?;
    out.decrease_indent();
    out.write_line("}")?;
    out.write_line("")?;
    Ok(())
}

fn write_struct_serializers(out: &mut Output<'_>, namespace: &str, aggregate: &AggregateDecl) -> Result<(), NidlError> {
    let ty = format!("{}::{}", namespace, aggregate.name);

    out.write_divider()?;
    out.write_line(&format!("template<> void JsonReader::Get<{ty}>({ty}& ret, const char* attr)", ty = ty))?;
    out.write_line("{")?;
    out.increase_indent();
    out.write_line(&format!("ret = {}();", ty))?;
    out.write_line("const pjson::value_variant* node = this->GetChild(attr);")?;
    out.write_line("if (node->is_object())")?;
    out.write_line("{")?;
    out.increase_indent();
    out.write_line("this->SetToNode(attr);")?;
    for field in &aggregate.fields {
        out.write_line(&format!(
            "if (this->HasAttr(\"{f}\")) this->Get<{t}>(ret.{f}, \"{f}\");",
            f = field.name,
            t = qualified(namespace, &field.ty)
        ))?;
    }
    out.write_line("this->SetToParent();")?;
    out.decrease_indent();
    out.write_line("}")?;
    out.decrease_indent();
    out.write_line("}")?;
    out.write_line("")?;

    out.write_divider()?;
    out.write_line(&format!(
        "template<> void JsonWriter::Add<{ty}>({ty} const& value, Util::String const& attr)",
        ty = ty
    ))?;
    out.write_line("{")?;
    out.increase_indent();
    out.write_line("this->BeginObject(attr.AsCharPtr());")?;
    for field in &aggregate.fields {
        out.write_line(&format!(
            "this->Add<{t}>(value.{f}, \"{f}\");",
            f = field.name,
            t = qualified(namespace, &field.ty)
        ))?;
    }
    out.write_line("this->End();")?;
    out.decrease_indent();
    out.write_line("}")?;
    out.write_line("")?;
    Ok(())
}

fn write_array_serializers(out: &mut Output<'_>, namespace: &str, aggregate: &AggregateDecl) -> Result<(), NidlError> {
    let item = format!("{}::{}", namespace, aggregate.name);
    let ty = format!("Util::Array<{}>", item);

    out.write_divider()?;
    out.write_line(&format!("template<> void JsonReader::Get<{ty}>({ty}& ret, const char* attr)", ty = ty))?;
    out.write_line("{")?;
    out.increase_indent();
    out.write_line("ret.Clear();")?;
    out.write_line("const pjson::value_variant* node = this->GetChild(attr);")?;
    out.write_line("if (node->is_array())")?;
    out.write_line("{")?;
    out.increase_indent();
    out.write_line("this->SetToNode(attr);")?;
    out.write_line("ret.Reserve(node->size());")?;
    out.write_line("if (this->SetToFirstChild())")?;
    out.write_line("{")?;
    out.increase_indent();
    out.write_line("do")?;
    out.write_line("{")?;
    out.increase_indent();
    out.write_line(&format!("{} item;", item))?;
    out.write_line(&format!("this->Get<{}>(item, nullptr);", item))?;
    out.write_line("ret.Append(item);")?;
    out.decrease_indent();
    out.write_line("} while (this->SetToNextChild());")?;
    out.write_line("this->SetToParent();")?;
    out.decrease_indent();
    out.write_line("}")?;
    out.write_line("this->SetToParent();")?;
    out.decrease_indent();
    out.write_line("}")?;
    out.decrease_indent();
    out.write_line("}")?;
    out.write_line("")?;

    out.write_divider()?;
    out.write_line(&format!(
        "template<> void JsonWriter::Add<{ty}>({ty} const& value, Util::String const& attr)",
        ty = ty
    ))?;
    out.write_line("{")?;
    out.increase_indent();
    out.write_line("this->BeginArray(attr.AsCharPtr());")?;
    out.write_line("for (IndexT i = 0; i < value.Size(); i++)")?;
    out.write_line("{")?;
    out.increase_indent();
    out.write_line(&format!("this->Add<{}>(value[i], \"\");", item))?;
    out.decrease_indent();
    out.write_line("}")?;
    out.write_line("this->End();")?;
    out.decrease_indent();
    out.write_line("}")?;
    out.write_line("")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{filewriter::FileWriter, model::build_model};
    use std::io::Write;
    use std::path::Path;

    fn render(text: &str) -> String {
        let document = Document::from_str(Path::new("scene.nidl"), text).unwrap();
        let model = build_model(&document).unwrap();
        let mut buffer: Vec<u8> = Vec::new();
        {
            let mut out = FileWriter::new(&mut buffer as &mut dyn Write);
            let backend = CppSource {
                version:     3,
                header_name: "scene.h".to_string(),
            };
            backend.emit(&document, &model, &mut out).unwrap();
            out.finish().unwrap();
        }
        String::from_utf8(buffer).unwrap()
    }

    #[test]
    fn includes_header_without_pragma() {
        let text = render("");
        assert!(text.starts_with("// NIDL #version:3#\n//----"));
        assert!(text.contains("#include \"foundation/stdneb.h\"\n#include \"scene.h\"\n"));
        assert!(!text.contains("pragma"));
        assert!(!text.contains("jsonreader"));
        assert!(!text.contains("namespace Details"));
    }

    #[test]
    fn registration_block() {
        let text = render("components = { Transform = { position = \"vec3\", rotation = \"quat\" } }");
        assert!(text.contains(
            "\t\tGame::TypeRegistry::Register<Transform>(\"Transform\", Transform(), Transform::Traits::num_fields, Transform::Traits::field_names, Transform::Traits::field_byte_offsets);\n"
        ));
        assert!(text.contains("namespace Details\n{\n"));
        assert!(text.contains("\tstatic const bool typesRegistered = RegisterTypes();\n"));
        assert!(text.contains("\ttemplate<> void JsonReader::Get<Game::Transform>(Game::Transform& ret, const char* attr)\n"));
        assert!(text.contains("\t\t\tif (this->HasAttr(\"position\")) this->Get<Math::vec3>(ret.position, \"position\");\n"));
    }

    #[test]
    fn attribute_definitions() {
        let text = render("attributes = { Color = { type = \"vec4\", fourcc = \"LCLR\", default = [1, 0.88, 0.65, 1] } }");
        assert!(text.contains(
            "\tDefineFloat4WithDefault(Color, 'LCLR', Attr::ReadWrite, Math::vec4(1.0f, 0.88f, 0.65f, 1.0f));\n"
        ));
    }

    #[test]
    fn messages_broadcast_and_bind() {
        let text = render(
            "enums = { Mode = { On = 0, Off = 1 } }\n\
             messages = {\n\
                 Toggle = { fourcc = \"TOGL\", args = { mode = \"Mode\", strength = \"float\" } }\n\
                 Internal = { fourcc = \"INTR\", export = false }\n\
             }",
        );
        assert!(text.contains("Toggle::Send(Mode mode, float strength)\n{\n"));
        assert!(text.contains("\t\tsubscribers[i](mode, strength);\n"));
        assert!(text.contains("\tSend(static_cast<Mode>(args[0].Get<int>()), args[1].Get<float>());\n"));
        assert!(text.contains("Scripting::MessageBindings::Register(\"Toggle\", 'TOGL', &Toggle::SendDynamic, 2);"));
        assert!(!text.contains("Register(\"Internal\""));
        assert!(text.contains("Internal::Subscribers()"));
        // Enum serializers appear even without struct-shaped aggregates.
        assert!(text.contains("if (str == \"Off\") { ret = Game::Mode::Off; return; }"));
    }

    #[test]
    fn array_serializers_only_when_allowed() {
        let text = render("structs = { Waypoint = { _array_ = true, pos = \"vec3\" }, Plain = { x = \"int\" } }");
        assert!(text.contains("JsonReader::Get<Util::Array<Game::Waypoint>>"));
        assert!(text.contains("JsonWriter::Add<Util::Array<Game::Waypoint>>"));
        assert!(!text.contains("Util::Array<Game::Plain>"));
    }

    #[test]
    fn single_field_components_get_no_serializers() {
        let text = render("components = { Speed = \"float\" }");
        assert!(!text.contains("namespace IO"));
        assert!(text.contains("Register<Speed>"));
    }
}
