//! Template domain — the parsed, classified shape of a Word template.
//!
//! A `Template` is a named container for `TemplateVersion`s; each version is
//! one parsed revision, broken into `Section`s that are either `static`
//! (copied verbatim into every document) or `dynamic` (filled by the model).

mod parsed;
mod section;
mod template;
mod template_version;

pub use parsed::{Block, BlockType, ParsedDocument, ParsedStatistics};
pub use section::{Section, SectionType};
pub use template::Template;
pub use template_version::{ParsingStatus, TemplateVersion};
