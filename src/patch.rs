//! Rewrites the `method` attribute and parameter text of grouped
//! `<method>` / `<transport>` entries in an XML config file.

use crate::document::{Document, ReadOptions};
use crate::element::Element;
use crate::error::{Error, Result};
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};

pub const GROUP_ATTR: &str = "group";
pub const METHOD_ATTR: &str = "method";

pub const TRANSPORT_DEFAULT_GROUP: &str = "writer";
pub const TRANSPORT_DEFAULT_METHOD: &str = "POSIX";

/// Which kind of entry a patcher edits. Each kind has its own tag and defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variant {
    /// `<method group=".." method="..">params</method>` in `adioscfg.xml`.
    Method,
    /// `<transport group=".." method="..">params</transport>` in `writer.xml`.
    Transport,
}

impl Variant {
    pub const fn tag(self) -> &'static str {
        match self {
            Variant::Method => "method",
            Variant::Transport => "transport",
        }
    }

    pub const fn default_file(self) -> &'static str {
        match self {
            Variant::Method => "adioscfg.xml",
            Variant::Transport => "writer.xml",
        }
    }

    /// `None` means the group must be given explicitly.
    pub const fn default_group(self) -> Option<&'static str> {
        match self {
            Variant::Method => None,
            Variant::Transport => Some(TRANSPORT_DEFAULT_GROUP),
        }
    }

    pub const fn default_method(self) -> Option<&'static str> {
        match self {
            Variant::Method => None,
            Variant::Transport => Some(TRANSPORT_DEFAULT_METHOD),
        }
    }

    pub const fn default_params(self) -> &'static str {
        match self {
            Variant::Method => "verbose=3",
            Variant::Transport => "local-fs=1,verbose=3",
        }
    }
}

/// What to do with a candidate element that has no `group` attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissingGroup {
    /// Abort with [`Error::MissingAttribute`] before anything is changed.
    #[default]
    Fail,
    /// Treat the element as not matching.
    Skip,
}

/// New values for every element of the target group.
///
/// `method` and `params` are opaque and written verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Patch {
    pub group: String,
    pub method: String,
    pub params: String,
}

impl Patch {
    pub fn new<G, M, P>(group: G, method: M, params: P) -> Patch
    where
        G: Into<String>,
        M: Into<String>,
        P: Into<String>,
    {
        Patch {
            group: group.into(),
            method: method.into(),
            params: params.into(),
        }
    }
}

/// Before/after values of one patched element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change {
    pub old_method: Option<String>,
    pub new_method: String,
    pub old_params: Option<String>,
    pub new_params: String,
}

struct OrNone<'a>(&'a Option<String>);

impl fmt::Display for OrNone<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(val) => f.write_str(val),
            None => f.write_str("None"),
        }
    }
}

impl fmt::Display for Change {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Changing method: {} => {}",
            OrNone(&self.old_method),
            self.new_method
        )?;
        write!(
            f,
            "Changing params: {} => {}",
            OrNone(&self.old_params),
            self.new_params
        )
    }
}

/// Patches every direct child of the root element named `tag` whose `group`
/// attribute equals `patch.group`.
///
/// All candidates are checked before the first write, so an error leaves
/// `doc` untouched. Zero matches is not an error.
///
/// # Errors
///
/// - [`Error::MalformedXML`]: The document has no root element.
/// - [`Error::MissingAttribute`]: A candidate has no `group` and `missing_group` is `Fail`.
pub fn apply(
    doc: &mut Document,
    tag: &str,
    patch: &Patch,
    missing_group: MissingGroup,
) -> Result<Vec<Change>> {
    let root = doc
        .root_element()
        .ok_or_else(|| Error::MalformedXML("No root element found".to_string()))?;

    let mut matches: Vec<Element> = Vec::new();
    for candidate in root.find_all(doc, tag) {
        match candidate.attribute(doc, GROUP_ATTR) {
            Some(group) if group == patch.group => matches.push(candidate),
            Some(_) => {}
            None if missing_group == MissingGroup::Skip => {
                tracing::warn!(tag, "skipping element without a `group` attribute");
            }
            None => {
                return Err(Error::MissingAttribute {
                    tag: tag.to_string(),
                    attribute: GROUP_ATTR.to_string(),
                })
            }
        }
    }

    let changes = matches
        .into_iter()
        .map(|elem| {
            let old_params = elem.text(doc);
            let old_method = elem.set_attribute(doc, METHOD_ATTR, patch.method.as_str());
            elem.set_text(doc, patch.params.as_str());
            Change {
                old_method,
                new_method: patch.method.clone(),
                old_params,
                new_params: patch.params.clone(),
            }
        })
        .collect::<Vec<_>>();
    tracing::debug!(tag, group = %patch.group, matched = changes.len(), "patch applied");
    Ok(changes)
}

/// Everything one patcher run needs. Defaults come from the [`Variant`].
#[derive(Debug, Clone)]
pub struct PatchOptions {
    pub variant: Variant,
    pub infile: PathBuf,
    pub outfile: PathBuf,
    pub patch: Patch,
    pub missing_group: MissingGroup,
    /// Must be set to let `outfile` be the same file as `infile`.
    pub in_place: bool,
    pub read_opts: ReadOptions,
}

impl PatchOptions {
    /// Reads from and writes to the variant's default file. Since that is an
    /// in-place edit, `in_place` still has to be switched on to run it.
    pub fn new(variant: Variant, patch: Patch) -> PatchOptions {
        PatchOptions {
            variant,
            infile: PathBuf::from(variant.default_file()),
            outfile: PathBuf::from(variant.default_file()),
            patch,
            missing_group: MissingGroup::default(),
            in_place: false,
            read_opts: ReadOptions::default(),
        }
    }

    pub fn infile<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.infile = path.into();
        self
    }

    pub fn outfile<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.outfile = path.into();
        self
    }

    pub fn in_place(mut self, yes: bool) -> Self {
        self.in_place = yes;
        self
    }

    pub fn missing_group(mut self, policy: MissingGroup) -> Self {
        self.missing_group = policy;
        self
    }
}

/// Outcome of a successful [`run`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub changes: Vec<Change>,
    pub outfile: PathBuf,
}

fn same_file(a: &Path, b: &Path) -> bool {
    if a == b {
        return true;
    }
    match (std::fs::canonicalize(a), std::fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Parses `infile`, patches it, prints the change lines to `out`,
/// writes the document to `outfile` and prints the `Saved:` line.
///
/// # Errors
///
/// - [`Error::WouldOverwrite`]: `outfile` is `infile` and `in_place` is off. Checked first.
/// - [`Error::Read`], [`Error::CannotDecode`], [`Error::MalformedXML`]: Input could not be parsed.
/// - [`Error::MissingAttribute`]: See [`apply`].
/// - [`Error::Write`]: Output could not be written.
pub fn run(opts: &PatchOptions, out: &mut impl Write) -> Result<Report> {
    if same_file(&opts.infile, &opts.outfile) {
        if !opts.in_place {
            return Err(Error::WouldOverwrite(opts.outfile.clone()));
        }
        tracing::warn!(path = %opts.outfile.display(), "overwriting input file in place");
    }

    let mut doc = Document::parse_file_with_opts(&opts.infile, opts.read_opts.clone())?;
    let tag = opts.variant.tag();
    let changes = apply(&mut doc, tag, &opts.patch, opts.missing_group)?;
    if changes.is_empty() {
        tracing::info!(tag, group = %opts.patch.group, "no matching elements");
    }
    for change in &changes {
        writeln!(out, "{}", change)?;
    }

    doc.write_file(&opts.outfile)?;
    writeln!(out, "Saved: {}", opts.outfile.display())?;
    Ok(Report {
        changes,
        outfile: opts.outfile.clone(),
    })
}
