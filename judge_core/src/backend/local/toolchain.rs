use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// How to build and run one language. Command arguments may contain the
/// placeholders `{dir}` (working directory) and `{source}` (source file).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Toolchain {
    pub language: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    pub source_file: String,
    #[serde(default)]
    pub compile: Option<Vec<String>>,
    pub run: Vec<String>,
    #[serde(default)]
    pub entry_point: Option<EntryPoint>,
}

/// Rewrites the submitter's entry symbol to the name the toolchain expects,
/// e.g. any `public class Foo` to `public class Main`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryPoint {
    pub pattern: String,
    pub replacement: String,
}

#[derive(Debug)]
pub enum CompilerEnvironmentStatus {
    OK { version: String, path: String },
    Missing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GPPStandard {
    #[serde(rename = "c++11")]
    CPP11,
    #[serde(rename = "c++17")]
    CPP17,
}

impl Default for GPPStandard {
    fn default() -> Self {
        GPPStandard::CPP17
    }
}

impl From<GPPStandard> for String {
    fn from(v: GPPStandard) -> Self {
        match v {
            GPPStandard::CPP11 => "-std=c++11".into(),
            GPPStandard::CPP17 => "-std=c++17".into(),
        }
    }
}

fn args(v: &[&str]) -> Vec<String> {
    v.iter().map(|s| s.to_string()).collect()
}

impl Toolchain {
    pub fn java() -> Self {
        Self {
            language: "java".into(),
            aliases: vec![],
            source_file: "Main.java".into(),
            compile: Some(args(&["javac", "-encoding", "utf-8", "{source}"])),
            run: args(&["java", "-Xmx256m", "-Dfile.encoding=UTF-8", "-cp", "{dir}", "Main"]),
            entry_point: Some(EntryPoint {
                pattern: r"(?m)^(\s*)public\s+class\s+\w+".into(),
                replacement: "${1}public class Main".into(),
            }),
        }
    }

    pub fn c() -> Self {
        Self {
            language: "c".into(),
            aliases: vec![],
            source_file: "main.c".into(),
            compile: Some(args(&["gcc", "-O2", "-o", "{dir}/main", "{source}", "-lm"])),
            run: args(&["{dir}/main"]),
            entry_point: None,
        }
    }

    pub fn cpp(standard: GPPStandard) -> Self {
        let mut compile = args(&["g++", "-O2", "-o", "{dir}/main", "{source}"]);
        compile.push(standard.into());
        Self {
            language: "cpp".into(),
            aliases: vec!["c++".into()],
            source_file: "main.cpp".into(),
            compile: Some(compile),
            run: args(&["{dir}/main"]),
            entry_point: None,
        }
    }

    pub fn python() -> Self {
        Self {
            language: "python".into(),
            aliases: vec!["python3".into()],
            source_file: "main.py".into(),
            compile: None,
            run: args(&["python3", "{source}"]),
            entry_point: None,
        }
    }

    pub fn builtin(cpp_standard: GPPStandard) -> Vec<Self> {
        vec![
            Self::java(),
            Self::c(),
            Self::cpp(cpp_standard),
            Self::python(),
        ]
    }

    /// Applies the entry point rule, if any.
    pub fn prepare_source(&self, code: &str) -> Result<String> {
        match &self.entry_point {
            Some(rule) => {
                let rgx = Regex::new(&rule.pattern)?;
                Ok(rgx.replace_all(code, rule.replacement.as_str()).into_owned())
            }
            None => Ok(code.to_string()),
        }
    }

    /// Writes the prepared source into `dir` and returns its path.
    pub fn save(&self, dir: &Path, code: &str) -> Result<PathBuf> {
        let code_path = dir.join(&self.source_file);
        fs::write(&code_path, self.prepare_source(code)?)?;
        Ok(code_path)
    }

    pub fn expand(&self, template: &[String], dir: &Path, source: &Path) -> Vec<String> {
        let dir = dir.to_string_lossy();
        let source = source.to_string_lossy();
        template
            .iter()
            .map(|arg| arg.replace("{dir}", &dir).replace("{source}", &source))
            .collect()
    }

    /// The program that has to be installed for this toolchain to work.
    pub fn program(&self) -> Option<&str> {
        self.compile
            .as_ref()
            .and_then(|c| c.first())
            .or_else(|| self.run.first())
            .map(|s| s.as_str())
    }

    pub fn check_environment(&self) -> CompilerEnvironmentStatus {
        let program = match self.program() {
            Some(program) => program,
            None => return CompilerEnvironmentStatus::Missing,
        };
        match which::which(program) {
            Ok(path) => {
                let version = Command::new(&path)
                    .arg("--version")
                    .stdin(Stdio::null())
                    .output()
                    .ok()
                    .and_then(|output| {
                        let text = if output.stdout.is_empty() {
                            output.stderr
                        } else {
                            output.stdout
                        };
                        String::from_utf8_lossy(&text)
                            .lines()
                            .find(|l| !l.trim().is_empty())
                            .map(|l| l.trim().to_string())
                    })
                    .unwrap_or_default();

                CompilerEnvironmentStatus::OK {
                    version,
                    path: path.to_string_lossy().into(),
                }
            }
            Err(_) => CompilerEnvironmentStatus::Missing,
        }
    }
}

/// Toolchains by lowercase language tag and alias.
#[derive(Debug, Clone)]
pub struct ToolchainTable {
    toolchains: Vec<Toolchain>,
    index: BTreeMap<String, usize>,
}

impl ToolchainTable {
    /// Built-ins first; entries in `extra` replace a built-in with the same
    /// language or are appended.
    pub fn new(cpp_standard: GPPStandard, extra: &[Toolchain]) -> Self {
        let mut toolchains = Toolchain::builtin(cpp_standard);
        for toolchain in extra {
            match toolchains
                .iter_mut()
                .find(|t| t.language.eq_ignore_ascii_case(&toolchain.language))
            {
                Some(slot) => *slot = toolchain.clone(),
                None => toolchains.push(toolchain.clone()),
            }
        }

        let mut index = BTreeMap::new();
        for (i, toolchain) in toolchains.iter().enumerate() {
            index.insert(toolchain.language.to_lowercase(), i);
            for alias in toolchain.aliases.iter() {
                index.entry(alias.to_lowercase()).or_insert(i);
            }
        }

        Self { toolchains, index }
    }

    pub fn get(&self, language: &str) -> Option<&Toolchain> {
        self.index
            .get(&language.trim().to_lowercase())
            .map(|&i| &self.toolchains[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Toolchain> {
        self.toolchains.iter()
    }

    pub fn require(&self, language: &str) -> Result<&Toolchain> {
        self.get(language)
            .ok_or_else(|| Error::Environment(format!("no local toolchain for language `{}`", language)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn java_entry_point() -> Result<()> {
        let src = "import java.util.*;\n\npublic class Solution {\n    public static void main(String[] a) {}\n}\n";
        let out = Toolchain::java().prepare_source(src)?;
        assert!(out.contains("public class Main {"));
        assert!(!out.contains("Solution"));
        assert!(out.starts_with("import java.util.*;"));

        let indented = "  public class Foo{}";
        assert_eq!(Toolchain::java().prepare_source(indented)?, "  public class Main{}");
        Ok(())
    }

    #[test]
    fn no_entry_point_rule() -> Result<()> {
        let src = "int main(){return 0;}";
        assert_eq!(Toolchain::c().prepare_source(src)?, src);
        Ok(())
    }

    #[test]
    fn expand_placeholders() {
        let t = Toolchain::c();
        let argv = t.expand(
            t.compile.as_ref().unwrap(),
            Path::new("/w/1"),
            Path::new("/w/1/main.c"),
        );
        assert_eq!(argv, vec!["gcc", "-O2", "-o", "/w/1/main", "/w/1/main.c", "-lm"]);
        assert_eq!(t.expand(&t.run, Path::new("/w/1"), Path::new("/w/1/main.c")), vec!["/w/1/main"]);
    }

    #[test]
    fn cpp_standard() {
        let t = Toolchain::cpp(GPPStandard::CPP11);
        assert_eq!(t.compile.unwrap().last().unwrap(), "-std=c++11");

        let table = ToolchainTable::new(GPPStandard::CPP11, &[]);
        let cpp = table.get("c++").unwrap();
        assert_eq!(cpp.compile.as_ref().unwrap().last().unwrap(), "-std=c++11");
        let table = ToolchainTable::new(GPPStandard::default(), &[]);
        let cpp = table.get("cpp").unwrap();
        assert_eq!(cpp.compile.as_ref().unwrap().last().unwrap(), "-std=c++17");
    }

    #[test]
    fn table_lookup() {
        let sh = Toolchain {
            language: "sh".into(),
            aliases: vec!["bash".into()],
            source_file: "main.sh".into(),
            compile: None,
            run: vec!["sh".into(), "{source}".into()],
            entry_point: None,
        };
        let python = Toolchain {
            run: vec!["pypy3".into(), "{source}".into()],
            ..Toolchain::python()
        };
        let table = ToolchainTable::new(GPPStandard::default(), &[sh, python]);
        assert_eq!(table.get("JAVA").unwrap().source_file, "Main.java");
        assert_eq!(table.get("c++").unwrap().language, "cpp");
        assert_eq!(table.get("bash").unwrap().language, "sh");
        assert_eq!(table.get("python3").unwrap().run[0], "pypy3");
        assert!(table.get("cobol").is_none());
        assert!(matches!(table.require("cobol"), Err(Error::Environment(_))));
        assert_eq!(table.iter().count(), 5);
    }

    #[test]
    fn sh_environment() {
        let t = Toolchain {
            language: "sh".into(),
            aliases: vec![],
            source_file: "main.sh".into(),
            compile: None,
            run: vec!["sh".into(), "{source}".into()],
            entry_point: None,
        };
        match t.check_environment() {
            CompilerEnvironmentStatus::OK { version: _, path } => {
                assert!(matches!(which::which("sh"), Ok(_)));
                assert!(!path.is_empty());
            }
            CompilerEnvironmentStatus::Missing => {
                assert!(matches!(which::which("sh"), Err(_)));
            }
        }
    }
}
