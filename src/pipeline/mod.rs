//! Pipeline stages for document-to-quiz generation.
//!
//! Each submodule implements one step; data only flows forward.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ extract ──▶ normalize ──▶ segment ──▶ llm ──▶ assemble
//! (path/URL) (pdf/docx/txt) (strip md)  (split)   (1 call   (numbered
//!                                                  per seg)  artifact)
//! ```
//!
//! 1. [`input`]: load the document bytes from a local path or URL
//! 2. [`extract`]: decode the full text; PDF and DOCX run in
//!    `spawn_blocking`
//! 3. [`normalize`]: strip bold, italic, heading and bullet markers
//! 4. [`segment`]: split by delimiter or into a fixed number of pieces
//! 5. [`llm`]: fill the prompt, call the back-end, classify the reply;
//!    the only stage with network I/O
//! 6. [`assemble`]: number the generated items and render the artifact

pub mod assemble;
pub mod extract;
pub mod input;
pub mod llm;
pub mod normalize;
pub mod segment;
