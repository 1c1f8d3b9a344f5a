//! Interactive run setup
//!
//! Asks the operator for the few settings that vary per run. Empty input (or
//! a closed stdin) always takes the default shown in parentheses.

use crate::config::{ConfigError, Settings};
use crate::llm::ProviderType;
use crate::memory::MemoryStore;
use std::io::{BufRead, Write};

pub struct Prompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Print `question` and read one trimmed line; `None` on blank input or EOF.
    fn ask(&mut self, question: &str) -> Result<Option<String>, ConfigError> {
        write!(self.output, "{question}")?;
        self.output.flush()?;

        let mut line = String::new();
        self.input.read_line(&mut line)?;
        let answer = line.trim();
        Ok((!answer.is_empty()).then(|| answer.to_string()))
    }

    pub fn select_provider(&mut self, default: ProviderType) -> Result<ProviderType, ConfigError> {
        let default_choice = match default {
            ProviderType::Gemini => "1",
            ProviderType::ChatGpt => "2",
        };
        writeln!(self.output, "Select an AI provider:")?;
        writeln!(self.output, "1: {}", ProviderType::Gemini.display_name())?;
        writeln!(self.output, "2: {}", ProviderType::ChatGpt.display_name())?;

        loop {
            let Some(answer) = self.ask(&format!("Choice ({default_choice}): "))? else {
                return Ok(default);
            };
            match answer.as_str() {
                "1" => return Ok(ProviderType::Gemini),
                "2" => return Ok(ProviderType::ChatGpt),
                other => {
                    if let Ok(provider) = other.parse::<ProviderType>() {
                        return Ok(provider);
                    }
                    writeln!(self.output, "Please enter 1 or 2.")?;
                }
            }
        }
    }

    /// Show the stored summary and ask whether to build on it; defaults to yes.
    pub fn confirm_memory(&mut self, summary: &str) -> Result<bool, ConfigError> {
        writeln!(self.output, "Summary of the previous conversation:\n{summary}\n")?;
        let answer = self.ask("Continue from the previous conversation? (Y/n): ")?;
        Ok(answer.is_none_or(|a| a.to_ascii_lowercase().starts_with('y')))
    }

    pub fn opening_prompt(&mut self, default: &str) -> Result<String, ConfigError> {
        let question = if default.is_empty() {
            "Opening prompt (none): ".to_string()
        } else {
            format!("Opening prompt ({default}): ")
        };
        Ok(self.ask(&question)?.unwrap_or_else(|| default.to_string()))
    }

    pub fn turn_count(&mut self, default: usize) -> Result<usize, ConfigError> {
        loop {
            let Some(answer) = self.ask(&format!("Number of turns ({default}): "))? else {
                return Ok(default);
            };
            match answer.parse::<usize>() {
                Ok(turns) if turns > 0 => return Ok(turns),
                _ => writeln!(self.output, "Please enter a positive whole number.")?,
            }
        }
    }
}

/// Fill in the per-run settings from the operator's answers.
///
/// The memory question is only asked when `USE_MEMORY` was left unset and a
/// non-empty memory exists.
pub fn configure<R: BufRead, W: Write>(
    settings: &mut Settings,
    memory: &MemoryStore,
    prompter: &mut Prompter<R, W>,
) -> Result<(), ConfigError> {
    settings.provider_type = prompter.select_provider(settings.provider_type)?;

    if settings.use_memory.is_none() {
        let summary = memory.load();
        settings.use_memory = Some(!summary.is_empty() && prompter.confirm_memory(&summary)?);
    }

    settings.prompt = prompter.opening_prompt(&settings.prompt)?;
    settings.turns = prompter.turn_count(settings.turns)?;

    tracing::debug!(
        provider = %settings.provider_type,
        turns = settings.turns,
        use_memory = ?settings.use_memory,
        "Interactive setup complete"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tempfile::TempDir;

    fn prompter(input: &str) -> Prompter<Cursor<Vec<u8>>, Vec<u8>> {
        Prompter::new(Cursor::new(input.as_bytes().to_vec()), Vec::new())
    }

    fn output(p: &Prompter<Cursor<Vec<u8>>, Vec<u8>>) -> String {
        String::from_utf8(p.output.clone()).unwrap()
    }

    #[test]
    fn test_provider_choice() {
        assert_eq!(
            prompter("2\n").select_provider(ProviderType::Gemini).unwrap(),
            ProviderType::ChatGpt
        );
        assert_eq!(
            prompter("\n").select_provider(ProviderType::ChatGpt).unwrap(),
            ProviderType::ChatGpt
        );
        assert_eq!(
            prompter("openai\n").select_provider(ProviderType::Gemini).unwrap(),
            ProviderType::ChatGpt
        );
    }

    #[test]
    fn test_provider_reasked_until_valid() {
        let mut p = prompter("3\nclaude\n1\n");
        assert_eq!(
            p.select_provider(ProviderType::ChatGpt).unwrap(),
            ProviderType::Gemini
        );
        assert_eq!(output(&p).matches("Please enter 1 or 2.").count(), 2);
    }

    #[test]
    fn test_eof_takes_defaults() {
        let mut p = prompter("");
        assert_eq!(p.select_provider(ProviderType::Gemini).unwrap(), ProviderType::Gemini);
        assert!(p.confirm_memory("- recap").unwrap());
        assert_eq!(p.opening_prompt("Hello").unwrap(), "Hello");
        assert_eq!(p.turn_count(4).unwrap(), 4);
    }

    #[test]
    fn test_turns_reasked_until_positive() {
        let mut p = prompter("zero\n0\n-2\n7\n");
        assert_eq!(p.turn_count(5).unwrap(), 7);
        assert_eq!(
            output(&p).matches("Please enter a positive whole number.").count(),
            3
        );
    }

    #[test]
    fn test_memory_answer() {
        assert!(prompter("y\n").confirm_memory("- recap").unwrap());
        assert!(prompter("Yes please\n").confirm_memory("- recap").unwrap());
        assert!(prompter("\n").confirm_memory("- recap").unwrap());
        assert!(!prompter("n\n").confirm_memory("- recap").unwrap());
        assert!(!prompter("nope\n").confirm_memory("- recap").unwrap());
    }

    #[test]
    fn test_memory_summary_shown_before_question() {
        let mut p = prompter("\n");
        assert!(p.confirm_memory("- Mira lost the lamp key").unwrap());

        let out = output(&p);
        let summary_at = out.find("- Mira lost the lamp key").unwrap();
        let question_at = out.find("(Y/n)").unwrap();
        assert!(summary_at < question_at);
    }

    #[test]
    fn test_configure_with_memory() {
        let temp = TempDir::new().unwrap();
        let memory = MemoryStore::new(temp.path().join("memory.md"));
        memory.save("- earlier events");
        let mut settings = Settings::default();

        let mut p = prompter("2\ny\nTalk about boats\n3\n");
        configure(&mut settings, &memory, &mut p).unwrap();

        assert_eq!(settings.provider_type, ProviderType::ChatGpt);
        assert_eq!(settings.use_memory, Some(true));
        assert_eq!(settings.prompt, "Talk about boats");
        assert_eq!(settings.turns, 3);
    }

    #[test]
    fn test_configure_skips_memory_question_without_memory() {
        let temp = TempDir::new().unwrap();
        let memory = MemoryStore::new(temp.path().join("missing.md"));
        let mut settings = Settings::default();

        // No memory answer is consumed: "y" lands in the prompt
        let mut p = prompter("1\ny\n\n");
        configure(&mut settings, &memory, &mut p).unwrap();

        assert_eq!(settings.use_memory, Some(false));
        assert_eq!(settings.prompt, "y");
        assert_eq!(settings.turns, 5);
        assert!(!output(&p).contains("previous conversation"));
    }

    #[test]
    fn test_configure_respects_preset_memory_flag() {
        let temp = TempDir::new().unwrap();
        let memory = MemoryStore::new(temp.path().join("memory.md"));
        memory.save("- earlier events");
        let mut settings = Settings {
            use_memory: Some(false),
            ..Settings::default()
        };

        let mut p = prompter("\n\n\n");
        configure(&mut settings, &memory, &mut p).unwrap();

        assert_eq!(settings.use_memory, Some(false));
        assert!(!output(&p).contains("previous conversation"));
    }
}
