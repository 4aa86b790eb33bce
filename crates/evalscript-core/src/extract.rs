// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Pull an already-written script out of a free-text reply.

use crate::program::VERSION_HEADER;

const OPEN_FENCE: &str = "```javascript\n";
const CLOSE_FENCE: &str = "\n```";

/// Return the trimmed contents of the first ```` ```javascript ```` block.
///
/// `None` when the reply has no such block. A block that is never closed
/// runs to the end of the reply.
pub fn extract_fenced_script(reply: &str) -> Option<&str> {
    let start = reply.find(OPEN_FENCE)? + OPEN_FENCE.len();
    let rest = &reply[start..];
    let end = rest.find(CLOSE_FENCE).unwrap_or(rest.len());
    Some(rest[..end].trim())
}

/// Whether the first line of `script` is the `//VERSION=3` header.
pub fn has_version_header(script: &str) -> bool {
    script.lines().next().map(str::trim_end) == Some(VERSION_HEADER)
}
