//! Parse normalized definition lines into [`Directive`]s using PEST.

use crate::ast::*;
use pest::Parser;
use pest_derive::Parser as PestParser;

#[derive(PestParser)]
#[grammar = "grammar.pest"]
struct LineParser;

/// Trim and collapse internal whitespace runs to a single space.
pub fn normalize_line(line: &str) -> String {
    line.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Parse one normalized line. `Err` carries the reason the line matched no grammar.
pub fn parse_line(line: &str) -> Result<Directive, String> {
    let pairs = LineParser::parse(Rule::line, line).map_err(|e| format!("Parse error: {}", e))?;
    let line_pair = pairs.into_iter().next().ok_or("Empty parse")?;
    let directive = line_pair
        .into_inner()
        .find(|p| p.as_rule() != Rule::EOI)
        .ok_or("Empty line")?;
    match directive.as_rule() {
        Rule::struct_start => build_struct_start(directive, true),
        Rule::struct_no_prefix_start => build_struct_start(directive, false),
        Rule::end_struct => Ok(Directive::EndStruct),
        Rule::bit_line => build_bit(directive),
        Rule::custom_line => build_custom(directive),
        Rule::define_line => build_define(directive),
        Rule::field_line => build_field(directive).map(Directive::Field),
        other => Err(format!("Unhandled line rule: {:?}", other)),
    }
}

fn build_struct_start(
    pair: pest::iterators::Pair<Rule>,
    uses_prefix: bool,
) -> Result<Directive, String> {
    let mut name = None;
    let mut comment = None;
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::word => name = Some(inner.as_str().to_string()),
            Rule::rest => comment = Some(inner.as_str().trim().to_string()),
            _ => {}
        }
    }
    Ok(Directive::StructStart {
        name: name.ok_or("struct: missing name")?,
        comment: comment.filter(|c| !c.is_empty()),
        uses_prefix,
    })
}

fn build_bit(pair: pest::iterators::Pair<Rule>) -> Result<Directive, String> {
    let mut name = None;
    let mut comment = String::new();
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::bit_name => name = Some(inner.as_str().trim().to_string()),
            Rule::rest => comment = unquote(inner.as_str()),
            _ => {}
        }
    }
    let name = name.filter(|n| !n.is_empty()).ok_or("bit: missing name")?;
    Ok(Directive::Bit { name, comment })
}

fn build_custom(pair: pest::iterators::Pair<Rule>) -> Result<Directive, String> {
    let mut words = Vec::new();
    let mut descriptor = String::new();
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::word => words.push(inner.as_str().to_string()),
            Rule::rest => descriptor = inner.as_str().trim().to_string(),
            _ => {}
        }
    }
    let mut words = words.into_iter();
    let name = words.next().ok_or("custom: missing name")?;
    let size = words.next().ok_or("custom: missing size")?;
    Ok(Directive::Custom {
        name,
        size,
        descriptor,
    })
}

fn build_define(pair: pest::iterators::Pair<Rule>) -> Result<Directive, String> {
    let mut name = None;
    let mut value = String::new();
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::word => name = Some(inner.as_str().to_string()),
            Rule::rest => value = inner.as_str().trim().to_string(),
            _ => {}
        }
    }
    Ok(Directive::Define {
        name: name.ok_or("#define: missing name")?,
        value,
    })
}

fn build_field(pair: pest::iterators::Pair<Rule>) -> Result<FieldDecl, String> {
    let mut type_name = None;
    let mut name = None;
    let mut dims = Vec::new();
    let mut comment = String::new();
    let mut ts_info = None;
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::type_name => type_name = Some(inner.as_str().to_string()),
            Rule::field_name => name = Some(inner.as_str().to_string()),
            Rule::dims => dims.push(build_dims(inner)?),
            Rule::comment => comment = unquote(inner.as_str()),
            Rule::ts_info => ts_info = Some(inner.as_str().trim().to_string()),
            _ => {}
        }
    }
    if dims.len() > 1 {
        return Err("array size given on both type and name".to_string());
    }
    let (array_size, is_iterate) = match dims.pop() {
        Some((size, iterate)) => (Some(size), iterate),
        None => (None, false),
    };
    Ok(FieldDecl {
        type_name: type_name.ok_or("field: missing type")?,
        name: name.ok_or("field: missing name")?,
        array_size,
        is_iterate,
        comment,
        ts_info: ts_info.filter(|t| !t.is_empty()),
    })
}

fn build_dims(pair: pest::iterators::Pair<Rule>) -> Result<(String, bool), String> {
    let mut size = None;
    let mut iterate = false;
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::array_size => size = Some(inner.as_str().to_string()),
            Rule::iterate => iterate = true,
            _ => {}
        }
    }
    Ok((size.ok_or("array: missing size")?, iterate))
}

fn unquote(s: &str) -> String {
    let s = s.trim();
    if s.len() >= 2 && s.starts_with('"') && s.ends_with('"') {
        s[1..s.len() - 1].to_string()
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_collapses_whitespace() {
        assert_eq!(normalize_line("  float \t  x ;  a  b "), "float x ; a b");
        assert_eq!(normalize_line("   "), "");
    }

    #[test]
    fn struct_with_comment() {
        assert_eq!(
            parse_line("struct engine_s Main config").unwrap(),
            Directive::StructStart {
                name: "engine_s".to_string(),
                comment: Some("Main config".to_string()),
                uses_prefix: true,
            }
        );
        assert_eq!(
            parse_line("struct_no_prefix persistent_s").unwrap(),
            Directive::StructStart {
                name: "persistent_s".to_string(),
                comment: None,
                uses_prefix: false,
            }
        );
    }

    #[test]
    fn end_struct_and_bit() {
        assert_eq!(parse_line("end_struct").unwrap(), Directive::EndStruct);
        assert_eq!(
            parse_line("bit isFanOn;\"Fan enabled\"").unwrap(),
            Directive::Bit {
                name: "isFanOn".to_string(),
                comment: "Fan enabled".to_string(),
            }
        );
        assert_eq!(
            parse_line("bit isFanOn").unwrap(),
            Directive::Bit {
                name: "isFanOn".to_string(),
                comment: String::new(),
            }
        );
    }

    #[test]
    fn custom_and_define() {
        assert_eq!(
            parse_line("custom pin_e 1 bits, U08, @OFFSET@, [0:6]").unwrap(),
            Directive::Custom {
                name: "pin_e".to_string(),
                size: "1".to_string(),
                descriptor: "bits, U08, @OFFSET@, [0:6]".to_string(),
            }
        );
        assert_eq!(
            parse_line("#define SIZE 16").unwrap(),
            Directive::Define {
                name: "SIZE".to_string(),
                value: "16".to_string(),
            }
        );
        assert_eq!(
            parse_line("#define EMPTY").unwrap(),
            Directive::Define {
                name: "EMPTY".to_string(),
                value: String::new(),
            }
        );
    }

    #[test]
    fn field_forms() {
        let Directive::Field(f) = parse_line("uint8_t a").unwrap() else {
            panic!("expected field");
        };
        assert_eq!((f.type_name.as_str(), f.name.as_str()), ("uint8_t", "a"));
        assert_eq!(f.array_size, None);

        let Directive::Field(f) =
            parse_line("float[CLT_SIZE] cltBins;Coolant bins;\"C\", 1, 0, -40, 150, 1").unwrap()
        else {
            panic!("expected field");
        };
        assert_eq!(f.array_size.as_deref(), Some("CLT_SIZE"));
        assert_eq!(f.comment, "Coolant bins");
        assert_eq!(f.ts_info.as_deref(), Some("\"C\", 1, 0, -40, 150, 1"));

        let Directive::Field(f) = parse_line("uint8_t[4 iterate] pins").unwrap() else {
            panic!("expected field");
        };
        assert!(f.is_iterate);

        let Directive::Field(f) = parse_line("uint16_t rpm[8] ;engine speed").unwrap() else {
            panic!("expected field");
        };
        assert_eq!(f.array_size.as_deref(), Some("8"));
        assert_eq!(f.comment, "engine speed");
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_line("this is not a field").is_err());
        assert!(parse_line("float[2] x[3]").is_err());
        assert!(parse_line("custom pin_e 1").is_err());
    }

    #[test]
    fn keyword_prefixes_need_a_space() {
        let Directive::Field(f) = parse_line("bitmask_t flags").unwrap() else {
            panic!("expected field");
        };
        assert_eq!(f.type_name, "bitmask_t");
    }
}
