//! The generation driver.
//!
//! Each emission pass loads the schema afresh, merges its dependencies and
//! rebuilds the model, so a header-only or source-only run produces exactly
//! what a full run would. Output is rendered into `<path>.tmp` and renamed
//! over `path` only once the whole file has been written.

use std::fmt;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use lazy_static::lazy_static;
use log::{debug, info};
use regex::Regex;

use crate::{
    backend::{Backend, CSharp, CppHeader, CppSource},
    document::{DependencyCache, Document, MergePolicy, DEFAULT_NAMESPACE},
    error::NidlError,
    filewriter::FileWriter,
    model::build_model,
    types::Model,
};

/// Bumped whenever the emitted format changes.
pub const GENERATOR_VERSION: u32 = 1;

lazy_static! {
    static ref VERSION_STAMP: Regex = Regex::new(r"^//\s*NIDL\s+#version:(\d+)#").unwrap();
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorOptions {
    /// Namespace for schemas that do not declare one.
    pub default_namespace: String,
    pub merge_policy:      MergePolicy,
    /// Name the source file uses to include the header. Defaults to the
    /// header's file name.
    pub header_name:       Option<String>,
    pub version:           u32,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        GeneratorOptions {
            default_namespace: DEFAULT_NAMESPACE.to_string(),
            merge_policy:      MergePolicy::Overwrite,
            header_name:       None,
            version:           GENERATOR_VERSION,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeneratorState {
    Unloaded,
    DocumentLoaded,
    ModelBuilt,
    HeaderEmitted,
    SourceEmitted,
    CsEmitted,
    Failed,
}

impl fmt::Display for GeneratorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

pub struct Generator {
    schema_path: PathBuf,
    options:     GeneratorOptions,
    cache:       DependencyCache,
    state:       GeneratorState,
}

impl Generator {
    pub fn new(schema_path: impl Into<PathBuf>, options: GeneratorOptions) -> Self {
        Generator {
            schema_path: schema_path.into(),
            options,
            cache: DependencyCache::new(),
            state: GeneratorState::Unloaded,
        }
    }

    pub fn state(&self) -> GeneratorState {
        self.state
    }

    pub fn options(&self) -> &GeneratorOptions {
        &self.options
    }

    /// Load, merge and build without emitting anything.
    pub fn inspect(&mut self) -> Result<(Document, Model), NidlError> {
        self.expect_state(&[GeneratorState::Unloaded], "inspect")?;
        self.guarded(|gen| gen.build())
    }

    pub fn generate_header(&mut self, header_path: &Path) -> Result<(), NidlError> {
        self.expect_state(&[GeneratorState::Unloaded], "generate_header")?;
        self.guarded(|gen| {
            gen.stage_header(header_path)?.commit()?;
            gen.state = GeneratorState::HeaderEmitted;
            Ok(())
        })
    }

    /// `header_path` only provides the include name when none is configured.
    pub fn generate_source(&mut self, source_path: &Path, header_path: &Path) -> Result<(), NidlError> {
        self.expect_state(
            &[GeneratorState::Unloaded, GeneratorState::HeaderEmitted],
            "generate_source",
        )?;
        self.guarded(|gen| {
            gen.stage_source(source_path, header_path)?.commit()?;
            gen.state = GeneratorState::SourceEmitted;
            Ok(())
        })
    }

    pub fn generate_csharp(&mut self, cs_path: &Path) -> Result<(), NidlError> {
        self.expect_state(&[GeneratorState::Unloaded], "generate_csharp")?;
        self.guarded(|gen| {
            let (document, model) = gen.build()?;
            let backend = CSharp { version: gen.options.version };
            write_atomically(cs_path, &backend, &document, &model)?;
            gen.state = GeneratorState::CsEmitted;
            Ok(())
        })
    }

    /// Header, then source. Both files are rendered before either replaces
    /// its previous version.
    pub fn generate(&mut self, source_path: &Path, header_path: &Path) -> Result<(), NidlError> {
        self.expect_state(&[GeneratorState::Unloaded], "generate")?;
        self.guarded(|gen| {
            let header = gen.stage_header(header_path)?;
            let source = gen.stage_source(source_path, header_path)?;
            header.commit()?;
            gen.state = GeneratorState::HeaderEmitted;
            source.commit()?;
            gen.state = GeneratorState::SourceEmitted;
            Ok(())
        })
    }

    fn stage_header(&mut self, header_path: &Path) -> Result<StagedFile, NidlError> {
        let (document, model) = self.build()?;
        let backend = CppHeader { version: self.options.version };
        StagedFile::render(header_path, &backend, &document, &model)
    }

    fn stage_source(&mut self, source_path: &Path, header_path: &Path) -> Result<StagedFile, NidlError> {
        let (document, model) = self.build()?;
        let header_name = match self.options.header_name {
            Some(ref name) => name.clone(),
            None => file_name(header_path),
        };
        let backend = CppSource {
            version: self.options.version,
            header_name,
        };
        StagedFile::render(source_path, &backend, &document, &model)
    }

    fn build(&mut self) -> Result<(Document, Model), NidlError> {
        let mut document = Document::load(&self.schema_path)?;
        document.set_default_namespace(&self.options.default_namespace);
        self.cache.merge_into(&mut document, self.options.merge_policy)?;
        self.state = GeneratorState::DocumentLoaded;
        debug!(
            "{}: loaded with {} merged entries",
            self.schema_path.display(),
            document.overlay().entries().len()
        );

        let model = build_model(&document)?;
        self.state = GeneratorState::ModelBuilt;
        Ok((document, model))
    }

    fn expect_state(&self, allowed: &[GeneratorState], operation: &str) -> Result<(), NidlError> {
        if allowed.contains(&self.state) {
            return Ok(());
        }
        Err(NidlError::Emit(format!(
            "{} is not allowed in state {}",
            operation, self.state
        )))
    }

    fn guarded<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T, NidlError>) -> Result<T, NidlError> {
        let result = f(self);
        if result.is_err() {
            self.state = GeneratorState::Failed;
        }
        result
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".tmp");
    PathBuf::from(name)
}

/// A fully rendered `<path>.tmp` waiting to be renamed over `path`. Dropping
/// it without committing removes the temporary file.
struct StagedFile {
    tmp:       PathBuf,
    path:      PathBuf,
    backend:   &'static str,
    committed: bool,
}

impl StagedFile {
    fn render(path: &Path, backend: &dyn Backend, document: &Document, model: &Model) -> Result<StagedFile, NidlError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| NidlError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let staged = StagedFile {
            tmp:       temp_path(path),
            path:      path.to_path_buf(),
            backend:   backend.name(),
            committed: false,
        };
        render(&staged.tmp, backend, document, model).map_err(|err| err.with_path(&staged.tmp))?;
        debug!("rendered {} into {}", staged.backend, staged.tmp.display());
        Ok(staged)
    }

    fn commit(mut self) -> Result<(), NidlError> {
        fs::rename(&self.tmp, &self.path).map_err(|source| NidlError::Io {
            path: self.path.clone(),
            source,
        })?;
        self.committed = true;
        info!("wrote {} {}", self.backend, self.path.display());
        Ok(())
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        if !self.committed {
            // Nothing useful can be done if the cleanup fails as well.
            let _ = fs::remove_file(&self.tmp);
        }
    }
}

/// Render `backend` into `<path>.tmp` and rename it over `path`. On any
/// error the temporary file is removed and `path` is left untouched.
pub fn write_atomically(
    path: &Path,
    backend: &dyn Backend,
    document: &Document,
    model: &Model,
) -> Result<(), NidlError> {
    StagedFile::render(path, backend, document, model)?.commit()
}

fn render(tmp: &Path, backend: &dyn Backend, document: &Document, model: &Model) -> Result<(), NidlError> {
    let file = File::create(tmp).map_err(|source| NidlError::Io {
        path: tmp.to_path_buf(),
        source,
    })?;
    let mut buffered = BufWriter::new(file);
    let mut out = FileWriter::new(&mut buffered as &mut dyn Write);
    backend.emit(document, model, &mut out)?;
    out.finish()?;
    Ok(())
}

/// The generator version stamped on the first line of `text`, if any.
pub fn parse_version_stamp(text: &str) -> Option<u32> {
    let first = text.lines().next()?;
    VERSION_STAMP.captures(first)?.get(1)?.as_str().parse().ok()
}

pub fn read_version_stamp(path: &Path) -> Result<Option<u32>, NidlError> {
    let text = fs::read_to_string(path).map_err(|source| NidlError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(parse_version_stamp(&text))
}
