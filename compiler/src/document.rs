use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use log::{debug, warn};
use nidl_schema::{Map, Value};

use crate::{error::NidlError, filewriter::FileWriter};

pub const DEFAULT_NAMESPACE: &str = "Game";

/// Sections spliced in from dependency documents.
pub const MERGED_SECTIONS: [&str; 4] = ["attributes", "components", "structs", "properties"];

/// What to do when a dependency redeclares an entry that already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MergePolicy {
    /// Last loaded wins; the collision is logged as a warning.
    #[default]
    Overwrite,
    /// A collision is an error.
    Strict,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MergedEntry {
    pub section: String,
    pub name:    String,
    /// The file that declares the entry.
    pub source:  PathBuf,
    /// The dependency it was merged through.
    pub via:     PathBuf,
    /// True if the entry replaced a declaration from another file.
    pub replaced: bool,
}

/// Record of everything dependency merging did to a document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DependencyOverlay {
    entries: Vec<MergedEntry>,
    origins: HashMap<(String, String), PathBuf>,
}

impl DependencyOverlay {
    pub fn entries(&self) -> &[MergedEntry] {
        &self.entries
    }

    pub fn collisions(&self) -> impl Iterator<Item = &MergedEntry> {
        self.entries.iter().filter(|e| e.replaced)
    }

    /// The declaring file of a merged entry, if it came from a dependency.
    pub fn origin(&self, section: &str, name: &str) -> Option<&Path> {
        self.origins
            .get(&(section.to_string(), name.to_string()))
            .map(PathBuf::as_path)
    }
}

/// One loaded schema file.
#[derive(Debug, Clone)]
pub struct Document {
    path:      PathBuf,
    root:      Map,
    namespace: String,
    overlay:   DependencyOverlay,
}

impl Document {
    pub fn load(path: &Path) -> Result<Document, NidlError> {
        debug!("loading schema {}", path.display());
        let text = fs::read_to_string(path).map_err(|source| NidlError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Document::from_str(path, &text)
    }

    /// Parse `text` as if it had been read from `path`. Relative dependency
    /// paths resolve against the directory of `path`.
    pub fn from_str(path: &Path, text: &str) -> Result<Document, NidlError> {
        let root = nidl_schema::parse(text).map_err(|source| NidlError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        let namespace = match root.get("namespace") {
            None => DEFAULT_NAMESPACE.to_string(),
            Some(Value::String(ns)) if !ns.is_empty() => ns.clone(),
            Some(other) => {
                return Err(NidlError::validation(
                    "namespace",
                    format!("expected a non-empty string, found {}", other.kind()),
                ))
            }
        };
        Ok(Document {
            path: path.to_path_buf(),
            root,
            namespace,
            overlay: DependencyOverlay::default(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File name of the schema, used in generated banners.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    pub fn root(&self) -> &Map {
        &self.root
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Replace the namespace used when the schema does not declare one.
    pub fn set_default_namespace(&mut self, namespace: &str) {
        if !self.root.contains_key("namespace") {
            self.namespace = namespace.to_string();
        }
    }

    pub fn overlay(&self) -> &DependencyOverlay {
        &self.overlay
    }

    /// A named section, which must be an object if present.
    pub fn section(&self, name: &str) -> Result<Option<&Map>, NidlError> {
        match self.root.get(name) {
            None => Ok(None),
            Some(Value::Object(map)) => Ok(Some(map)),
            Some(other) => Err(NidlError::validation(
                name,
                format!("section must be an object, found {}", other.kind()),
            )),
        }
    }

    pub fn includes(&self) -> Result<Vec<String>, NidlError> {
        self.string_list("includes")
    }

    /// Dependency paths, resolved against the directory of this document.
    pub fn dependencies(&self) -> Result<Vec<PathBuf>, NidlError> {
        let base = self.path.parent().unwrap_or_else(|| Path::new(""));
        Ok(self
            .string_list("dependencies")?
            .into_iter()
            .map(|dep| base.join(dep))
            .collect())
    }

    fn string_list(&self, key: &str) -> Result<Vec<String>, NidlError> {
        match self.root.get(key) {
            None => Ok(Vec::new()),
            Some(Value::Array(values)) => values
                .iter()
                .map(|v| {
                    v.as_str().map(str::to_string).ok_or_else(|| {
                        NidlError::validation(key, format!("expected strings, found {}", v.kind()))
                    })
                })
                .collect(),
            Some(other) => Err(NidlError::validation(
                key,
                format!("expected a list of strings, found {}", other.kind()),
            )),
        }
    }

    /// Splice the merged sections of `dependency` into this document. Entries
    /// already present are overwritten, or rejected under
    /// [`MergePolicy::Strict`].
    pub fn merge_dependency(&mut self, dependency: &Document, policy: MergePolicy) -> Result<(), NidlError> {
        for section in MERGED_SECTIONS {
            let incoming = match dependency.section(section)? {
                Some(map) => map.clone(),
                None => continue,
            };
            // Validate our own section shape before touching it.
            self.section(section)?;
            if !self.root.contains_key(section) {
                self.root.insert(section, Value::Object(Map::new()));
            }
            let target = match self.root.get_mut(section).and_then(Value::as_object_mut) {
                Some(target) => target,
                None => continue,
            };

            for (name, value) in incoming.iter() {
                let source = dependency.origin(section, name).to_path_buf();
                // The same declaration reached through two paths is not a collision.
                let replaced =
                    target.contains_key(name) && origin_of(&self.overlay, &self.path, section, name) != source.as_path();
                if replaced {
                    if policy == MergePolicy::Strict {
                        return Err(NidlError::DependencyCollision {
                            section: section.to_string(),
                            name:    name.to_string(),
                            path:    source,
                        });
                    }
                    warn!(
                        "{}: {}.{} is overridden by {}",
                        self.path.display(),
                        section,
                        name,
                        source.display()
                    );
                }
                target.insert(name, value.clone());
                self.overlay
                    .origins
                    .insert((section.to_string(), name.to_string()), source.clone());
                self.overlay.entries.push(MergedEntry {
                    section: section.to_string(),
                    name: name.to_string(),
                    source,
                    via: dependency.path.clone(),
                    replaced,
                });
            }
        }
        Ok(())
    }

    /// The file that declares `section.name` as this document sees it.
    pub fn origin(&self, section: &str, name: &str) -> &Path {
        origin_of(&self.overlay, &self.path, section, name)
    }

    /// First lines of every generated file: version stamp, optional
    /// `#pragma once` and the generated-file banner.
    pub fn write_include_header<W: Write>(
        &self,
        out: &mut FileWriter<W>,
        version: u32,
        pragma_once: bool,
    ) -> io::Result<()> {
        out.write_line(&format!("// NIDL #version:{}#", version))?;
        if pragma_once {
            out.write_line("#pragma once")?;
        }
        out.write_line(crate::filewriter::DIVIDER)?;
        out.write_line("/**")?;
        out.increase_indent();
        out.write_line("This file was generated with Nebula's IDL compiler tool.")?;
        out.write_line(&format!("Source: {}", self.file_name()))?;
        out.write_line("DO NOT EDIT")?;
        out.decrease_indent();
        out.write_line("*/")
    }

    pub fn write_includes<W: Write>(&self, out: &mut FileWriter<W>, includes: &[String]) -> io::Result<()> {
        for include in includes {
            out.write_line(&format!("#include \"{}\"", include))?;
        }
        Ok(())
    }

    /// Open the document namespace. Contents are not indented.
    pub fn begin_namespace<W: Write>(&self, out: &mut FileWriter<W>) -> Result<(), NidlError> {
        out.write_line(&format!("namespace {}", self.namespace))?;
        out.write_line("{")?;
        out.push_scope(&self.namespace);
        Ok(())
    }

    pub fn end_namespace<W: Write>(&self, out: &mut FileWriter<W>) -> Result<(), NidlError> {
        out.pop_scope(&self.namespace)?;
        out.write_line(&format!("}} // namespace {}", self.namespace))?;
        Ok(())
    }

    /// Open an explicitly named namespace, possibly nested inside the
    /// document namespace. Contents are indented one level.
    pub fn begin_namespace_override<W: Write>(&self, out: &mut FileWriter<W>, name: &str) -> Result<(), NidlError> {
        out.write_line(&format!("namespace {}", name))?;
        out.write_line("{")?;
        out.increase_indent();
        out.push_scope(name);
        Ok(())
    }

    pub fn end_namespace_override<W: Write>(&self, out: &mut FileWriter<W>, name: &str) -> Result<(), NidlError> {
        out.pop_scope(name)?;
        out.decrease_indent();
        out.write_line(&format!("}} // namespace {}", name))?;
        Ok(())
    }
}

fn origin_of<'a>(overlay: &'a DependencyOverlay, own: &'a Path, section: &str, name: &str) -> &'a Path {
    overlay.origin(section, name).unwrap_or(own)
}

/// Parsed dependency documents, keyed by canonical path, kept for the
/// lifetime of one generator.
#[derive(Debug, Default)]
pub struct DependencyCache {
    documents:   HashMap<PathBuf, Document>,
    in_progress: Vec<PathBuf>,
}

impl DependencyCache {
    pub fn new() -> Self {
        DependencyCache::default()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Merge every dependency of `document`, depth first and in declared
    /// order. Dependencies are themselves merged with their own
    /// dependencies before being spliced in.
    pub fn merge_into(&mut self, document: &mut Document, policy: MergePolicy) -> Result<(), NidlError> {
        for path in document.dependencies()? {
            let dependency = self.resolve(&path, policy)?;
            debug!("merging {} into {}", dependency.path().display(), document.path().display());
            document.merge_dependency(dependency, policy)?;
        }
        Ok(())
    }

    fn resolve(&mut self, path: &Path, policy: MergePolicy) -> Result<&Document, NidlError> {
        let key = fs::canonicalize(path).map_err(|source| NidlError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        if self.in_progress.contains(&key) {
            return Err(NidlError::DependencyCycle(path.to_path_buf()));
        }
        if !self.documents.contains_key(&key) {
            self.in_progress.push(key.clone());
            let result = Document::load(path).and_then(|mut document| {
                self.merge_into(&mut document, policy)?;
                Ok(document)
            });
            self.in_progress.pop();
            self.documents.insert(key.clone(), result?);
        } else {
            debug!("dependency cache hit for {}", path.display());
        }
        self.documents
            .get(&key)
            .ok_or_else(|| NidlError::Emit(format!("dependency {} vanished from cache", path.display())))
    }
}
