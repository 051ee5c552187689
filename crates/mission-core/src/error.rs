//! Errors returned by mission operations.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MissionError {
    #[error("step index {index} out of range for mission with {len} steps")]
    IndexOutOfRange { index: usize, len: usize },

    /// Removing the step would leave the Section after it without a start.
    #[error("step {index} anchors the section that follows it and cannot be removed")]
    SectionAnchorRemoval { index: usize },

    #[error("the first mission step cannot be a section")]
    LeadingSection,

    #[error("{indices} indices given for {steps} replacement steps")]
    MismatchedUpdate { indices: usize, steps: usize },

    #[error("section at step {index} does not start at the previous step's position")]
    BrokenSectionLink { index: usize },

    #[error("invalid mission document: {0}")]
    InvalidDocument(String),

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::DeError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
