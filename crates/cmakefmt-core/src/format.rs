// crates/cmakefmt-core/src/format.rs - Listfile Formatting Engine
//
// The orchestrator only needs "text in, text out" from this module, so the
// engine sits behind the `Formatter` trait. `ListFileFormatter` is the
// built-in implementation: a line-oriented pass that understands enough of
// the listfile grammar to re-indent safely.
//
// WHAT IT NORMALIZES:
// - Line endings (per `line_ending`)
// - Indentation, recomputed from block commands and open parentheses
// - Trailing whitespace, leading/trailing blank lines, runs of blank lines
// - Command name case and the gap between a command name and "("
//
// WHAT IT NEVER TOUCHES:
// - Content of quoted arguments and bracket arguments/comments, including
//   continuation lines of multi-line strings
//
// Formatting is idempotent: every decision depends only on structure, never
// on the whitespace the input happened to have.

use thiserror::Error;

use crate::config::{CommandCase, FormatConfig, LineEnding};

/// Errors raised when the input cannot be formatted
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    #[error("line {line}: unexpected ')' with no open parenthesis")]
    UnexpectedCloseParen { line: usize },

    #[error("line {line}: command arguments are never closed with ')'")]
    UnclosedParen { line: usize },

    #[error("line {line}: quoted argument is never terminated")]
    UnterminatedQuote { line: usize },

    #[error("line {line}: bracket argument is never terminated")]
    UnterminatedBracket { line: usize },

    #[error("line {line}: {command}() does not close an open block")]
    UnmatchedBlockEnd { line: usize, command: String },

    #[error("line {line}: {command}() block is never closed")]
    UnclosedBlock { line: usize, command: String },
}

/// Result type for formatting operations
pub type FormatResult<T> = Result<T, FormatError>;

/// A text transformation parameterized by configuration
///
/// Implementations must be deterministic and should be idempotent.
pub trait Formatter {
    fn format(&self, text: &str, config: &FormatConfig) -> FormatResult<String>;
}

/// Built-in formatter for CMake listfiles
#[derive(Debug, Default, Clone, Copy)]
pub struct ListFileFormatter;

impl Formatter for ListFileFormatter {
    fn format(&self, text: &str, config: &FormatConfig) -> FormatResult<String> {
        format_listfile(text, config)
    }
}

/// Lexical mode carried from one physical line to the next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Code,
    Quoted { opened_at: usize },
    Bracket { equals: usize, opened_at: usize },
}

/// Lexer state that survives line boundaries
#[derive(Debug, Clone, Copy)]
struct ScanState {
    mode: Mode,
    paren_depth: usize,
}

/// Block command kinds that affect indentation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlockRole {
    Open,
    Middle,
    Close(&'static str),
}

/// An open block on the stack
struct OpenBlock {
    command: String,
    line: usize,
}

/// Commands that count as flow control for `separate_ctrl_name_with_space`
const CONTROL_COMMANDS: &[&str] = &[
    "if",
    "elseif",
    "else",
    "endif",
    "foreach",
    "endforeach",
    "while",
    "endwhile",
];

fn block_role(command: &str) -> Option<BlockRole> {
    match command {
        "if" | "foreach" | "while" | "function" | "macro" | "block" => Some(BlockRole::Open),
        "elseif" | "else" => Some(BlockRole::Middle),
        "endif" => Some(BlockRole::Close("if")),
        "endforeach" => Some(BlockRole::Close("foreach")),
        "endwhile" => Some(BlockRole::Close("while")),
        "endfunction" => Some(BlockRole::Close("function")),
        "endmacro" => Some(BlockRole::Close("macro")),
        "endblock" => Some(BlockRole::Close("block")),
        _ => None,
    }
}

/// Format a complete listfile
///
/// ALGORITHM:
/// Walks physical lines once. Lines that start inside a quoted or bracket
/// argument are copied verbatim. Every other line is re-indented from the
/// block stack (for statement starts) or from the open parenthesis depth of
/// the current statement (for continuation lines), then scanned to update
/// the lexer state for the next line.
pub fn format_listfile(text: &str, config: &FormatConfig) -> FormatResult<String> {
    let newline = match config.line_ending {
        LineEnding::Unix => "\n",
        LineEnding::Windows => "\r\n",
        LineEnding::Auto => detect_line_ending(text),
    };

    let mut out: Vec<String> = Vec::new();
    let mut blocks: Vec<OpenBlock> = Vec::new();
    let mut state = ScanState {
        mode: Mode::Code,
        paren_depth: 0,
    };
    let mut statement_level = 0;
    let mut statement_line = 0;
    let mut pending_blank = 0;

    for (index, raw) in text.split('\n').enumerate() {
        let line_no = index + 1;
        let raw = raw.strip_suffix('\r').unwrap_or(raw);

        if state.mode != Mode::Code {
            state = scan_line(raw, state, line_no)?;
            let kept = if state.mode == Mode::Code { raw.trim_end() } else { raw };
            out.push(kept.to_string());
            continue;
        }

        let body = raw.trim_start();
        if body.trim_end().is_empty() {
            pending_blank += 1;
            continue;
        }

        if !out.is_empty() {
            let blanks = pending_blank.min(config.max_empty_lines);
            out.extend(std::iter::repeat_n(String::new(), blanks));
        }
        pending_blank = 0;

        let (level, body) = if state.paren_depth == 0 {
            statement_line = line_no;
            let (level, rewritten) = start_statement(body, &mut blocks, line_no, config)?;
            statement_level = level;
            (level, rewritten)
        } else {
            let closing = usize::from(body.starts_with(')'));
            (statement_level + state.paren_depth - closing, body.to_string())
        };

        state = scan_line(&body, state, line_no)?;
        let body = if state.mode == Mode::Code { body.trim_end() } else { body.as_str() };
        out.push(format!("{}{}", indent(level, config), body));
    }

    match state.mode {
        Mode::Quoted { opened_at } => {
            return Err(FormatError::UnterminatedQuote { line: opened_at });
        }
        Mode::Bracket { opened_at, .. } => {
            return Err(FormatError::UnterminatedBracket { line: opened_at });
        }
        Mode::Code => {}
    }
    if state.paren_depth > 0 {
        return Err(FormatError::UnclosedParen {
            line: statement_line,
        });
    }
    if let Some(open) = blocks.pop() {
        return Err(FormatError::UnclosedBlock {
            line: open.line,
            command: open.command,
        });
    }

    if out.is_empty() {
        return Ok(String::new());
    }
    let mut formatted = out.join(newline);
    formatted.push_str(newline);
    Ok(formatted)
}

/// Handle the first line of a statement: block bookkeeping and name rewrite
///
/// Returns the indentation level and the rewritten line body.
fn start_statement(
    body: &str,
    blocks: &mut Vec<OpenBlock>,
    line_no: usize,
    config: &FormatConfig,
) -> FormatResult<(usize, String)> {
    let Some((name, rest)) = split_command(body) else {
        // Comments and anything that is not a command invocation
        return Ok((blocks.len(), body.to_string()));
    };

    let command = name.to_ascii_lowercase();
    let level = match block_role(&command) {
        Some(BlockRole::Open) => {
            let level = blocks.len();
            blocks.push(OpenBlock {
                command: command.clone(),
                line: line_no,
            });
            level
        }
        Some(BlockRole::Middle) => match blocks.last() {
            Some(open) if open.command == "if" => blocks.len() - 1,
            _ => {
                return Err(FormatError::UnmatchedBlockEnd {
                    line: line_no,
                    command,
                });
            }
        },
        Some(BlockRole::Close(opener)) => match blocks.last() {
            Some(open) if open.command == opener => {
                blocks.pop();
                blocks.len()
            }
            _ => {
                return Err(FormatError::UnmatchedBlockEnd {
                    line: line_no,
                    command,
                });
            }
        },
        None => blocks.len(),
    };

    let cased = match config.command_case {
        CommandCase::Lower => name.to_ascii_lowercase(),
        CommandCase::Upper => name.to_ascii_uppercase(),
        CommandCase::Unchanged => name.to_string(),
    };
    let separate = if CONTROL_COMMANDS.contains(&command.as_str()) {
        config.separate_ctrl_name_with_space
    } else {
        config.separate_fn_name_with_space
    };
    let gap = if separate { " " } else { "" };

    Ok((level, format!("{cased}{gap}{rest}")))
}

/// Split `name   (args...` into the command name and the text from "(" on
fn split_command(body: &str) -> Option<(&str, &str)> {
    let mut chars = body.char_indices();
    match chars.next() {
        Some((_, c)) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return None,
    }

    let name_end = body
        .char_indices()
        .find(|&(_, c)| !(c.is_ascii_alphanumeric() || c == '_'))
        .map_or(body.len(), |(i, _)| i);

    let rest = body[name_end..].trim_start_matches([' ', '\t']);
    rest.starts_with('(').then(|| (&body[..name_end], rest))
}

/// Advance the lexer over one physical line
fn scan_line(line: &str, mut state: ScanState, line_no: usize) -> FormatResult<ScanState> {
    let bytes = line.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        match state.mode {
            Mode::Quoted { .. } => match bytes[i] {
                b'\\' => i += 2,
                b'"' => {
                    state.mode = Mode::Code;
                    i += 1;
                }
                _ => i += 1,
            },
            Mode::Bracket { equals, .. } => {
                if bytes[i] == b']' && closes_bracket(&bytes[i + 1..], equals) {
                    state.mode = Mode::Code;
                    i += equals + 2;
                } else {
                    i += 1;
                }
            }
            Mode::Code => match bytes[i] {
                b'\\' => i += 2,
                b'"' => {
                    state.mode = Mode::Quoted { opened_at: line_no };
                    i += 1;
                }
                b'#' => match opens_bracket(&bytes[i + 1..]) {
                    Some(equals) => {
                        state.mode = Mode::Bracket {
                            equals,
                            opened_at: line_no,
                        };
                        i += equals + 3;
                    }
                    // Line comment: nothing else on this line matters
                    None => break,
                },
                b'[' if at_argument_start(bytes, i) => match opens_bracket(&bytes[i..]) {
                    Some(equals) => {
                        state.mode = Mode::Bracket {
                            equals,
                            opened_at: line_no,
                        };
                        i += equals + 2;
                    }
                    None => i += 1,
                },
                b'(' => {
                    state.paren_depth += 1;
                    i += 1;
                }
                b')' => {
                    if state.paren_depth == 0 {
                        return Err(FormatError::UnexpectedCloseParen { line: line_no });
                    }
                    state.paren_depth -= 1;
                    i += 1;
                }
                _ => i += 1,
            },
        }
    }

    Ok(state)
}

/// If `bytes` starts with `[`, `=`*n, `[`, return n
fn opens_bracket(bytes: &[u8]) -> Option<usize> {
    if bytes.first() != Some(&b'[') {
        return None;
    }
    let equals = bytes[1..].iter().take_while(|&&b| b == b'=').count();
    (bytes.get(1 + equals) == Some(&b'[')).then_some(equals)
}

/// Whether `bytes` (just after a `]`) continue with `=`*n then `]`
fn closes_bracket(bytes: &[u8], equals: usize) -> bool {
    bytes.len() > equals && bytes[..equals].iter().all(|&b| b == b'=') && bytes[equals] == b']'
}

fn at_argument_start(bytes: &[u8], i: usize) -> bool {
    i == 0 || matches!(bytes[i - 1], b' ' | b'\t' | b'(')
}

fn indent(level: usize, config: &FormatConfig) -> String {
    if config.use_tabchars {
        "\t".repeat(level)
    } else {
        " ".repeat(level * config.tab_size)
    }
}

fn detect_line_ending(text: &str) -> &'static str {
    match text.find('\n') {
        Some(pos) if text[..pos].ends_with('\r') => "\r\n",
        _ => "\n",
    }
}
