//! Read file built-in tool.

use crate::shim::ExecutionShim;
use crate::tools::schema::{ArgKind, ArgumentSchema};
use crate::tools::{ToolError, ToolExecutionFuture, ToolExecutor, ToolOutput, ToolSpec};
use serde_json::Value;
use std::borrow::Cow;
use std::sync::Arc;

/// Returns a file's contents as text, one page at a time.
#[derive(Debug, Clone)]
pub struct ReadFileTool {
    shim: Arc<ExecutionShim>,
}

/// A byte range of a file, decoded for the model.
#[derive(Debug)]
struct Page {
    text: String,
    start: usize,
    end: usize,
    total: usize,
    /// Invalid UTF-8 was replaced with U+FFFD
    lossy: bool,
}

impl ReadFileTool {
    /// Creates the tool over a shared shim.
    #[must_use]
    pub fn new(shim: Arc<ExecutionShim>) -> Self {
        Self { shim }
    }
}

impl ToolExecutor for ReadFileTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec::new(
            "read_file",
            "Return the contents of a file. Relative paths resolve against the \
             workspace root. At most 64 KiB is returned per call; when more remains \
             the output ends with the `offset` to pass to continue reading.",
            ArgumentSchema::new()
                .required("path", ArgKind::String, "Path of the file to read")
                .optional(
                    "offset",
                    ArgKind::Integer,
                    "Byte offset to start reading from (default: 0)",
                )
                .optional(
                    "limit",
                    ArgKind::Integer,
                    "Maximum number of bytes to return (default and maximum: 65536)",
                ),
        )
    }

    fn execute(&self, args: Value) -> ToolExecutionFuture {
        let shim = Arc::clone(&self.shim);

        Box::pin(async move {
            let path = args["path"].as_str().unwrap_or_default();
            let offset = non_negative(&args, "offset")?.unwrap_or(0);
            let cap = shim.config().max_output_bytes;
            let limit = match non_negative(&args, "limit")? {
                Some(0) => {
                    return Err(ToolError::invalid_arguments(
                        "read_file",
                        "limit must be positive",
                    ))
                }
                Some(limit) => limit.min(cap),
                None => cap,
            };

            let bytes = shim.read_file(path).await?;
            Ok(ToolOutput::text(render_page(&page(&bytes, offset, limit))))
        })
    }
}

fn non_negative(args: &Value, key: &str) -> Result<Option<usize>, ToolError> {
    match args.get(key).and_then(Value::as_i64) {
        Some(n) if n < 0 => Err(ToolError::invalid_arguments(
            "read_file",
            format!("{key} must not be negative"),
        )),
        Some(n) => Ok(Some(usize::try_from(n).unwrap_or(usize::MAX))),
        None => Ok(None),
    }
}

/// Cuts `bytes[offset..offset + limit]`, never splitting a UTF-8 character.
fn page(bytes: &[u8], offset: usize, limit: usize) -> Page {
    let total = bytes.len();
    let start = offset.min(total);
    let mut end = start.saturating_add(limit).min(total);

    if end < total {
        if let Err(e) = std::str::from_utf8(&bytes[start..end]) {
            // An incomplete character at the edge moves to the next page.
            if e.error_len().is_none() && e.valid_up_to() > 0 {
                end = start + e.valid_up_to();
            }
        }
    }

    let (text, lossy) = match String::from_utf8_lossy(&bytes[start..end]) {
        Cow::Borrowed(text) => (text.to_string(), false),
        Cow::Owned(text) => (text, true),
    };
    Page {
        text,
        start,
        end,
        total,
        lossy,
    }
}

fn render_page(page: &Page) -> String {
    let mut out = page.text.clone();
    if page.lossy {
        out.push_str("\n\n(note: not valid UTF-8; invalid bytes were replaced with U+FFFD)");
    }
    if page.end < page.total {
        out.push_str(&format!(
            "\n\n... (bytes {}-{} of {} shown; call read_file with offset={} to continue)",
            page.start, page.end, page.total, page.end
        ));
    }
    out
}
