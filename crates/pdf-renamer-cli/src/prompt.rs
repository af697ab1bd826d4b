use pdf_renamer_core::{ConfirmationGate, Plan};
use std::io::{self, BufRead, Write};
use tracing::warn;

/// Ask a yes/no question on stdin. An empty answer takes `default`; with no
/// default the question repeats.
pub fn prompt_confirm(prompt: &str, default: Option<bool>) -> io::Result<bool> {
    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut output = io::stdout();
    read_confirm(&mut input, &mut output, prompt, default)
}

fn read_confirm<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    prompt: &str,
    default: Option<bool>,
) -> io::Result<bool> {
    let mut line = String::new();

    loop {
        line.clear();

        match default {
            Some(true) => write!(output, "{} (Y/n): ", prompt)?,
            Some(false) | None => write!(output, "{} (y/N): ", prompt)?,
        }
        output.flush()?;

        if input.read_line(&mut line)? == 0 {
            // stdin closed
            return Ok(default.unwrap_or(false));
        }

        match line.trim().to_uppercase().as_str() {
            "Y" | "YES" => return Ok(true),
            "N" | "NO" => return Ok(false),
            "" => match default {
                Some(default) => return Ok(default),
                None => continue,
            },
            _ => continue,
        }
    }
}

/// Interactive gate used unless `--yes` is given.
pub struct PromptGate;

impl ConfirmationGate for PromptGate {
    fn confirm_proceed(&self, _plan: &Plan) -> bool {
        match prompt_confirm("Proceed with renaming?", Some(true)) {
            Ok(answer) => answer,
            Err(e) => {
                warn!("Could not read confirmation: {}", e);
                false
            }
        }
    }
}
