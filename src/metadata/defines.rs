use std::fmt::Write;
use std::str::FromStr;

use crate::metadata::MetadataError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DefineValue {
    Int(u32),
    Str(String),
}

impl DefineValue {
    /// Value without any quoting, as an environment variable would carry it.
    pub fn raw(&self) -> String {
        match self {
            Self::Int(n) => n.to_string(),
            Self::Str(s) => s.clone(),
        }
    }

    /// Value as C source: integers bare, strings as escaped literals.
    pub fn c_literal(&self) -> String {
        match self {
            Self::Int(n) => n.to_string(),
            Self::Str(s) => {
                let mut out = String::with_capacity(s.len() + 2);
                out.push('"');
                for c in s.chars() {
                    match c {
                        '"' => out.push_str("\\\""),
                        '\\' => out.push_str("\\\\"),
                        '\n' => out.push_str("\\n"),
                        _ => out.push(c),
                    }
                }
                out.push('"');
                out
            }
        }
    }
}

/// One symbolic constant handed to the compiler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Define {
    pub name: String,
    pub value: DefineValue,
}

impl Define {
    pub fn int(name: impl Into<String>, value: u32) -> Self {
        Self {
            name: name.into(),
            value: DefineValue::Int(value),
        }
    }

    pub fn str(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: DefineValue::Str(value.into()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DefinesFormat {
    /// `'-DNAME="value"'`, one shell-quoted compiler flag per line.
    #[default]
    CFlags,
    /// `cargo:rustc-env=NAME=value`, for a build script.
    Cargo,
    /// A C header of `#define`s behind an include guard.
    Header,
    /// `NAME=value` lines.
    Env,
}

impl FromStr for DefinesFormat {
    type Err = MetadataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "cflags" => Ok(Self::CFlags),
            "cargo" => Ok(Self::Cargo),
            "header" => Ok(Self::Header),
            "env" => Ok(Self::Env),
            _ => Err(MetadataError::InvalidFormat(s.to_string())),
        }
    }
}

fn shell_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', r"'\''"))
}

/// Render defines in the given format. `guard` names the header include guard.
pub fn render_defines(defines: &[Define], format: DefinesFormat, guard: &str) -> String {
    let mut out = String::new();
    match format {
        DefinesFormat::CFlags => {
            for define in defines {
                let flag = format!("-D{}={}", define.name, define.value.c_literal());
                let _ = writeln!(out, "{}", shell_quote(&flag));
            }
        }
        DefinesFormat::Cargo => {
            for define in defines {
                let _ = writeln!(out, "cargo:rustc-env={}={}", define.name, define.value.raw());
            }
        }
        DefinesFormat::Env => {
            for define in defines {
                let _ = writeln!(out, "{}={}", define.name, define.value.raw());
            }
        }
        DefinesFormat::Header => {
            let _ = writeln!(out, "/* Generated by flashmerge. Do not edit. */");
            let _ = writeln!(out, "#ifndef {guard}");
            let _ = writeln!(out, "#define {guard}");
            let _ = writeln!(out);
            for define in defines {
                let _ = writeln!(out, "#define {} {}", define.name, define.value.c_literal());
            }
            let _ = writeln!(out);
            let _ = writeln!(out, "#endif /* {guard} */");
        }
    }
    out
}
