//! Structured C# emission
//!
//! [`SourceBuilder`] writes every line as a newline followed by indentation
//! and content, so a finished unit starts with a newline and has no trailing
//! one. Templates only fill typed slots; they never concatenate raw source.

use crate::models::generated::PropertyDescriptor;

const INDENT: &str = "    ";

#[derive(Debug, Default)]
pub struct SourceBuilder {
    out: String,
    depth: usize,
}

impl SourceBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder for a fragment that will be spliced in at `depth`
    pub fn at_depth(depth: usize) -> Self {
        Self {
            out: String::new(),
            depth,
        }
    }

    pub fn line(&mut self, content: &str) -> &mut Self {
        self.out.push('\n');
        for _ in 0..self.depth {
            self.out.push_str(INDENT);
        }
        self.out.push_str(content);
        self
    }

    pub fn blank(&mut self) -> &mut Self {
        self.out.push('\n');
        self
    }

    /// Lines written inside `body` are indented one level deeper
    pub fn indented(&mut self, body: impl FnOnce(&mut Self)) -> &mut Self {
        self.depth += 1;
        body(self);
        self.depth -= 1;
        self
    }

    /// `{` ... `}` around an indented body
    pub fn braced(&mut self, body: impl FnOnce(&mut Self)) -> &mut Self {
        self.line("{");
        self.indented(body);
        self.line("}")
    }

    pub fn fragment(&mut self, fragment: &str) -> &mut Self {
        self.out.push_str(fragment);
        self
    }

    pub fn finish(self) -> String {
        self.out
    }
}

/// Declaration of the marker attribute itself
pub struct MarkerAttributeTemplate<'a> {
    pub namespace: &'a str,
    pub marker: &'a str,
}

impl MarkerAttributeTemplate<'_> {
    pub fn class_name(&self) -> String {
        format!("{}Attribute", self.marker)
    }

    pub fn render(&self) -> String {
        let class_name = self.class_name();
        let mut b = SourceBuilder::new();
        b.line("using System;")
            .line(&format!("namespace {};", self.namespace))
            .blank()
            .line("[AttributeUsage(AttributeTargets.Class)]")
            .line(&format!("public class {class_name} : Attribute"))
            .braced(|b| {
                b.line(&format!("public {class_name}() {{}}"));
            });
        b.finish()
    }
}

/// The static serializer class wrapping every region
pub struct SerializerTemplate<'a> {
    pub namespace: &'a str,
    /// Pre-rendered regions, in discovery order
    pub regions: &'a [String],
}

impl SerializerTemplate<'_> {
    pub const CLASS_NAME: &'static str = "GeneratedSerializer";

    pub fn render(&self) -> String {
        let mut b = SourceBuilder::new();
        b.line("using System.Linq;")
            .line(&format!("namespace {};", self.namespace))
            .blank()
            .line(&format!("public static class {}", Self::CLASS_NAME))
            .line("{");
        for region in self.regions {
            b.fragment(region);
        }
        b.line("}");
        b.finish()
    }
}

/// One `#region` block: instance serializer, header and bulk serializer
pub struct RegionTemplate<'a> {
    pub type_name: &'a str,
    pub members: &'a [PropertyDescriptor],
}

impl RegionTemplate<'_> {
    pub fn render(&self) -> String {
        let type_name = self.type_name;
        let mut b = SourceBuilder::at_depth(1);

        b.line(&format!("#region {type_name}"))
            .line(&format!("public static string ToCsv(this {type_name} input) =>"))
            .indented(|b| {
                b.line(&format!("$\"{}\";", self.instance_interpolation()));
            })
            .blank()
            .line(&format!("public static string ToCsvHeader(this {type_name} input) =>"))
            .indented(|b| {
                b.line(&format!("\"{}\";", self.header()));
            })
            .blank()
            .line(&format!(
                "public static string ToCsv(this System.Collections.Generic.IEnumerable<{type_name}> input)"
            ))
            .braced(|b| {
                b.line("var sb = new System.Text.StringBuilder();")
                    .line("if (input.Any())")
                    .braced(|b| {
                        b.line("sb.AppendLine(input.First().ToCsvHeader());")
                            .line("foreach (var item in input)")
                            .braced(|b| {
                                b.line("sb.AppendLine(item.ToCsv());");
                            });
                    })
                    .line("return sb.ToString();");
            })
            .blank()
            .line("#endregion")
            .blank();
        b.finish()
    }

    /// Body of the interpolated string: textual members in escaped quotes
    fn instance_interpolation(&self) -> String {
        self.members
            .iter()
            .map(|m| {
                if m.is_textual() {
                    format!("\\\"{{input.{}}}\\\"", m.name)
                } else {
                    format!("{{input.{}}}", m.name)
                }
            })
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn header(&self) -> String {
        self.members
            .iter()
            .map(|m| m.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}
