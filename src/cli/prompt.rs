//! Interactive prompts on stdin

use std::io::{self, BufRead, IsTerminal, Write};

use anyhow::{bail, Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::terminal;

/// Asks a yes/no question; only `y` or `yes` (any case) confirm
pub fn confirm(question: &str) -> Result<bool> {
    let stdin = io::stdin();
    ask_yes_no(&mut stdin.lock(), &mut io::stderr(), question)
}

/// Reads a password from stdin without echoing it
///
/// Input that is not a terminal (pipes, tests) is read as one line.
pub fn prompt_password(label: &str) -> Result<String> {
    let stdin = io::stdin();
    let text = format!("{}: ", label);
    if !stdin.is_terminal() {
        return read_answer(&mut stdin.lock(), &mut io::stderr(), &text);
    }

    let mut stderr = io::stderr();
    write!(stderr, "{}", text)?;
    stderr.flush()?;

    terminal::enable_raw_mode().context("Failed to switch the terminal to raw mode")?;
    let password = collect_password(event::read);
    // Restore the terminal before reporting any read error
    terminal::disable_raw_mode().context("Failed to restore the terminal")?;
    writeln!(stderr)?;

    password
}

/// Collects key presses until Enter; Esc or Ctrl-C cancels
fn collect_password(mut next: impl FnMut() -> io::Result<Event>) -> Result<String> {
    let mut password = String::new();
    loop {
        let Event::Key(key) = next().context("Failed to read from the terminal")? else {
            continue;
        };
        // Only key presses, not releases
        if key.kind != KeyEventKind::Press {
            continue;
        }
        match key.code {
            KeyCode::Enter => return Ok(password),
            KeyCode::Esc => bail!("Password entry cancelled"),
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                bail!("Password entry cancelled")
            }
            KeyCode::Char(c) => password.push(c),
            KeyCode::Backspace => {
                password.pop();
            }
            _ => {}
        }
    }
}

fn ask_yes_no(input: &mut impl BufRead, prompt: &mut impl Write, question: &str) -> Result<bool> {
    let answer = read_answer(input, prompt, &format!("{} [y/N] ", question))?;
    Ok(matches!(answer.to_lowercase().as_str(), "y" | "yes"))
}

fn read_answer(input: &mut impl BufRead, prompt: &mut impl Write, text: &str) -> Result<String> {
    write!(prompt, "{}", text)?;
    prompt.flush()?;

    let mut line = String::new();
    input
        .read_line(&mut line)
        .context("Failed to read from stdin")?;
    Ok(line.trim().to_string())
}
