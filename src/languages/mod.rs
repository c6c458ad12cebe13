//! Language registry: selector id -> engine language, version and entry-point filename.

use std::{collections::HashMap, sync::OnceLock};

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LanguageSpec {
    /// Key used by the language selector, e.g. `python`.
    pub id: String,
    /// Language name the engine expects.
    pub engine_language: String,
    pub engine_version: String,
    /// Name of the single submitted file. The engine derives the entry point from it.
    pub filename: String,
    /// Starter buffer restored on reset.
    #[serde(skip)]
    pub template: String,
}

impl LanguageSpec {
    pub fn new(
        id: &str,
        engine_language: &str,
        engine_version: &str,
        filename: &str,
        template: &str,
    ) -> Self {
        Self {
            id: id.to_string(),
            engine_language: engine_language.to_string(),
            engine_version: engine_version.to_string(),
            filename: filename.to_string(),
            template: template.to_string(),
        }
    }

    pub fn extension(&self) -> Option<&str> {
        self.filename.rsplit_once('.').map(|(_, ext)| ext)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Registry {
    entries: Vec<LanguageSpec>,
    index: HashMap<String, usize>,
}

impl Registry {
    /// Later rows with a duplicate id replace earlier ones.
    pub fn new(specs: impl IntoIterator<Item = LanguageSpec>) -> Self {
        let mut reg = Self::default();
        for spec in specs {
            match reg.index.get(&spec.id) {
                Some(&i) => reg.entries[i] = spec,
                None => {
                    reg.index.insert(spec.id.clone(), reg.entries.len());
                    reg.entries.push(spec);
                }
            }
        }
        reg
    }

    pub fn builtin() -> &'static Registry {
        static BUILTIN: OnceLock<Registry> = OnceLock::new();
        BUILTIN.get_or_init(|| Registry::new(builtin_specs()))
    }

    pub fn resolve(&self, id: &str) -> Option<&LanguageSpec> {
        self.index.get(id.trim()).map(|&i| &self.entries[i])
    }

    pub fn by_extension(&self, ext: &str) -> Option<&LanguageSpec> {
        self.entries
            .iter()
            .find(|s| s.extension().is_some_and(|e| e.eq_ignore_ascii_case(ext)))
    }

    pub fn iter(&self) -> impl Iterator<Item = &LanguageSpec> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn builtin_specs() -> Vec<LanguageSpec> {
    vec![
        LanguageSpec::new("python", "python", "3.10.0", "main.py", "print(\"Hello, World!\")\n"),
        LanguageSpec::new(
            "javascript",
            "javascript",
            "18.15.0",
            "main.js",
            "console.log(\"Hello, World!\");\n",
        ),
        LanguageSpec::new(
            "typescript",
            "typescript",
            "5.0.3",
            "main.ts",
            "const greeting: string = \"Hello, World!\";\nconsole.log(greeting);\n",
        ),
        LanguageSpec::new(
            "c",
            "c",
            "10.2.0",
            "main.c",
            "#include <stdio.h>\n\nint main(void) {\n    printf(\"Hello, World!\\n\");\n    return 0;\n}\n",
        ),
        LanguageSpec::new(
            "cpp",
            "c++",
            "10.2.0",
            "main.cpp",
            "#include <iostream>\n\nint main() {\n    std::cout << \"Hello, World!\" << std::endl;\n    return 0;\n}\n",
        ),
        // The public class must match the file name.
        LanguageSpec::new(
            "java",
            "java",
            "15.0.2",
            "Main.java",
            "public class Main {\n    public static void main(String[] args) {\n        System.out.println(\"Hello, World!\");\n    }\n}\n",
        ),
        LanguageSpec::new(
            "go",
            "go",
            "1.16.2",
            "main.go",
            "package main\n\nimport \"fmt\"\n\nfunc main() {\n\tfmt.Println(\"Hello, World!\")\n}\n",
        ),
        LanguageSpec::new(
            "rust",
            "rust",
            "1.68.2",
            "main.rs",
            "fn main() {\n    println!(\"Hello, World!\");\n}\n",
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_builtin_resolves_to_itself() {
        let reg = Registry::builtin();
        assert_eq!(reg.len(), 8);
        for spec in reg.iter() {
            assert_eq!(reg.resolve(&spec.id), Some(spec));
            assert!(!spec.template.is_empty());
        }
    }

    #[test]
    fn unknown_and_case_mismatch_are_not_found() {
        let reg = Registry::builtin();
        assert!(reg.resolve("cobol").is_none());
        assert!(reg.resolve("Python").is_none());
        assert!(reg.resolve("").is_none());
        assert_eq!(reg.resolve(" python ").map(|s| s.id.as_str()), Some("python"));
    }

    #[test]
    fn java_file_matches_public_class() {
        let java = Registry::builtin().resolve("java").unwrap();
        assert_eq!(java.filename, "Main.java");
        assert!(java.template.contains("public class Main"));
    }

    #[test]
    fn extension_lookup() {
        let reg = Registry::builtin();
        assert_eq!(reg.by_extension("cpp").map(|s| s.engine_language.as_str()), Some("c++"));
        assert_eq!(reg.by_extension("RS").map(|s| s.id.as_str()), Some("rust"));
        assert!(reg.by_extension("txt").is_none());
    }

    #[test]
    fn duplicate_ids_keep_last_row() {
        let reg = Registry::new([
            LanguageSpec::new("py", "python", "3.8.0", "main.py", ""),
            LanguageSpec::new("py", "python", "3.12.0", "main.py", ""),
        ]);
        assert_eq!(reg.len(), 1);
        assert_eq!(reg.resolve("py").unwrap().engine_version, "3.12.0");
    }
}
