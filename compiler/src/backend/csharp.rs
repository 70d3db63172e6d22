use crate::{
    backend::{write_line_comments, Backend, Output},
    document::Document,
    error::NidlError,
    types::{AggregateDecl, AggregateKind, EnumDecl, Model},
};

const USINGS: [&str; 4] = ["System", "System.Runtime.InteropServices", "Mathf", "Nebula.Game"];

/// Sequential-layout C# mirrors of the enums and aggregates.
#[derive(Debug, Clone)]
pub struct CSharp {
    pub version: u32,
}

impl Backend for CSharp {
    fn name(&self) -> &'static str {
        "csharp"
    }

    fn emit(&self, document: &Document, model: &Model, out: &mut Output<'_>) -> Result<(), NidlError> {
        document.write_include_header(out, self.version, false)?;
        for using in USINGS {
            out.write_line(&format!("using {};", using))?;
        }
        out.write_line("")?;

        let namespace = model.namespace.replace("::", ".");
        document.begin_namespace_override(out, &namespace)?;
        for decl in &model.enums {
            write_enum(out, decl)?;
        }
        for aggregate in &model.aggregates {
            write_struct(out, aggregate)?;
        }
        document.end_namespace_override(out, &namespace)?;
        Ok(())
    }
}

fn write_enum(out: &mut Output<'_>, decl: &EnumDecl) -> Result<(), NidlError> {
    out.write_line(&format!("public enum {}", decl.name))?;
    out.write_line("{")?;
    out.increase_indent();
    for (key, value) in &decl.entries {
        out.write_line(&format!("{} = {},", key, value))?;
    }
    out.write_line(&format!("{} = {}", decl.sentinel(), decl.count()))?;
    out.decrease_indent();
    out.write_line("}")?;
    out.write_line("")?;
    Ok(())
}

fn write_struct(out: &mut Output<'_>, aggregate: &AggregateDecl) -> Result<(), NidlError> {
    if let Some(ref description) = aggregate.description {
        out.write_line("/// <summary>")?;
        write_line_comments(out, description)?;
        out.write_line("/// </summary>")?;
    }
    out.write_line("[NativeCppClass]")?;
    out.write_line("[StructLayout(LayoutKind.Sequential)]")?;
    match aggregate.kind {
        AggregateKind::Component => out.write_line(&format!("public struct {} : NativeComponent", aggregate.name))?,
        _ => out.write_line(&format!("public struct {}", aggregate.name))?,
    }
    out.write_line("{")?;
    out.increase_indent();
    for field in &aggregate.fields {
        if field.hide_in_inspector {
            out.write_line("[HideInInspector]")?;
        }
        out.write_line(&format!("public {} {};", field.ty.csharp(), field.name))?;
    }
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
            CSharp { version: 2 }.emit(&document, &model, &mut out).unwrap();
            out.finish().unwrap();
        }
        String::from_utf8(buffer).unwrap()
    }

    #[test]
    fn components_derive_native_component() {
        let text = render(
            "namespace = \"Graphics::Lights\"\n\
             enums = { Mode = { On = 0, Off = 1 } }\n\
             components = { Transform = { position = \"vec3\", owner = { type = \"entity\", hideInInspector = true } } }\n\
             structs = { Box = { extents = \"Math::bbox\", mode = \"Mode\" } }",
        );
        assert!(text.starts_with("// NIDL #version:2#\n"));
        assert!(text.contains("namespace Graphics.Lights\n{\n"));
        assert!(text.contains("\tpublic enum Mode\n\t{\n\t\tOn = 0,\n\t\tOff = 1,\n\t\tNumMode = 2\n\t}\n"));
        assert!(text.contains(
            "\t[NativeCppClass]\n\t[StructLayout(LayoutKind.Sequential)]\n\tpublic struct Transform : NativeComponent\n\t{\n\t\tpublic Mathf.Vector3 position;\n\t\t[HideInInspector]\n\t\tpublic Nebula.Game.Entity owner;\n\t}\n"
        ));
        assert!(text.contains("\tpublic struct Box\n\t{\n\t\tpublic Math.bbox extents;\n\t\tpublic Mode mode;\n\t}\n"));
        assert!(text.ends_with("} // namespace Graphics.Lights\n"));
    }

    #[test]
    fn multi_line_summaries_stay_commented() {
        let text = render("structs = { Box = { _description_ = [=[Axis aligned\nbounding box]=], min = \"vec3\", max = \"vec3\" } }");
        assert!(text.contains("\t/// <summary>\n\t/// Axis aligned\n\t/// bounding box\n\t/// </summary>\n"));
    }
}
