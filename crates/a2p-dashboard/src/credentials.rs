use std::io::{self, BufRead, IsTerminal, Write};

use a2p_cli::Cli;
use a2p_report::ReportError;
use a2p_twilio::TwilioCredentials;
use anyhow::{Context, Result};
use tracing::debug;

/// Source of answers for missing credentials.
pub(crate) trait CredentialPrompt {
    fn ask(&mut self, prompt: &str) -> Result<String>;

    /// Asks without echoing the answer back to the terminal.
    fn ask_secret(&mut self, prompt: &str) -> Result<String>;
}

struct TerminalPrompt<R: BufRead, W: Write> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> CredentialPrompt for TerminalPrompt<R, W> {
    fn ask(&mut self, prompt: &str) -> Result<String> {
        write!(self.output, "{prompt}").context("failed to write credential prompt")?;
        self.output
            .flush()
            .context("failed to flush credential prompt")?;
        let mut buffer = String::new();
        self.input
            .read_line(&mut buffer)
            .context("failed to read credential prompt response")?;
        Ok(buffer.trim().to_string())
    }

    fn ask_secret(&mut self, prompt: &str) -> Result<String> {
        let answer = rpassword::prompt_password(prompt).context("failed to read auth token")?;
        Ok(answer.trim().to_string())
    }
}

fn present(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

/// Fills missing credentials from `prompt` when `interactive`, otherwise fails
/// with `CredentialsMissing`. An empty answer also fails.
pub(crate) fn resolve_credentials_with(
    account_sid: Option<&str>,
    auth_token: Option<&str>,
    interactive: bool,
    prompt: &mut dyn CredentialPrompt,
) -> Result<TwilioCredentials> {
    let mut account_sid = present(account_sid);
    let mut auth_token = present(auth_token);
    if interactive {
        if account_sid.is_none() {
            account_sid = present(Some(prompt.ask("Twilio Account SID: ")?.as_str()));
        }
        if account_sid.is_some() && auth_token.is_none() {
            auth_token = present(Some(prompt.ask_secret("Twilio Auth Token: ")?.as_str()));
        }
    }
    match (account_sid, auth_token) {
        (Some(account_sid), Some(auth_token)) => {
            debug!(interactive, "resolved Twilio credentials");
            Ok(TwilioCredentials::new(account_sid, auth_token))
        }
        _ => Err(ReportError::CredentialsMissing.into()),
    }
}

pub(crate) fn resolve_credentials(cli: &Cli) -> Result<TwilioCredentials> {
    let interactive = !cli.no_prompt && io::stdin().is_terminal();
    let mut prompt = TerminalPrompt {
        input: io::stdin().lock(),
        output: io::stderr(),
    };
    resolve_credentials_with(
        cli.account_sid.as_deref(),
        cli.auth_token.as_deref(),
        interactive,
        &mut prompt,
    )
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::io::Cursor;

    use a2p_report::ReportError;
    use anyhow::Result;

    use super::{resolve_credentials_with, CredentialPrompt, TerminalPrompt};

    #[derive(Default)]
    struct ScriptedPrompt {
        answers: VecDeque<&'static str>,
        asked: Vec<(String, bool)>,
    }

    impl ScriptedPrompt {
        fn answering(answers: &[&'static str]) -> Self {
            Self {
                answers: answers.iter().copied().collect(),
                asked: Vec::new(),
            }
        }

        fn next_answer(&mut self, prompt: &str, secret: bool) -> Result<String> {
            self.asked.push((prompt.to_string(), secret));
            Ok(self.answers.pop_front().unwrap_or_default().to_string())
        }
    }

    impl CredentialPrompt for ScriptedPrompt {
        fn ask(&mut self, prompt: &str) -> Result<String> {
            self.next_answer(prompt, false)
        }

        fn ask_secret(&mut self, prompt: &str) -> Result<String> {
            self.next_answer(prompt, true)
        }
    }

    fn assert_missing(error: anyhow::Error) {
        assert!(matches!(
            error.downcast_ref::<ReportError>(),
            Some(ReportError::CredentialsMissing)
        ));
        assert_eq!(
            error.to_string(),
            "To get started, please provide your Twilio credentials"
        );
    }

    #[test]
    fn unit_explicit_credentials_skip_prompt() {
        let mut prompt = ScriptedPrompt::default();
        let credentials = resolve_credentials_with(Some(" AC123 "), Some("token"), true, &mut prompt)
            .expect("credentials");
        assert_eq!(credentials.account_sid, "AC123");
        assert_eq!(credentials.auth_token, "token");
        assert!(prompt.asked.is_empty());
    }

    #[test]
    fn functional_interactive_prompt_fills_missing_values() {
        let mut prompt = ScriptedPrompt::answering(&["AC999", " secret "]);
        let credentials =
            resolve_credentials_with(None, None, true, &mut prompt).expect("credentials");
        assert_eq!(credentials.account_sid, "AC999");
        assert_eq!(credentials.auth_token, "secret");
        assert_eq!(prompt.asked[0], ("Twilio Account SID: ".to_string(), false));
    }

    #[test]
    fn regression_auth_token_is_requested_without_echo() {
        let mut prompt = ScriptedPrompt::answering(&["secret"]);
        resolve_credentials_with(Some("AC123"), None, true, &mut prompt).expect("credentials");
        assert_eq!(
            prompt.asked,
            vec![("Twilio Auth Token: ".to_string(), true)]
        );
    }

    #[test]
    fn unit_terminal_prompt_reads_trimmed_visible_answer() {
        let mut output = Vec::new();
        let mut prompt = TerminalPrompt {
            input: Cursor::new(b"  AC777 \n".to_vec()),
            output: &mut output,
        };
        assert_eq!(prompt.ask("Twilio Account SID: ").expect("answer"), "AC777");
        assert_eq!(
            String::from_utf8(output).expect("utf8"),
            "Twilio Account SID: "
        );
    }

    #[test]
    fn regression_empty_prompt_answer_reports_missing_credentials() {
        let mut prompt = ScriptedPrompt::answering(&[""]);
        let error = resolve_credentials_with(None, Some("token"), true, &mut prompt)
            .expect_err("empty answer");
        assert_missing(error);
    }

    #[test]
    fn regression_non_interactive_missing_token_fails_without_prompt() {
        let mut prompt = ScriptedPrompt::answering(&["ignored"]);
        let error = resolve_credentials_with(Some("AC123"), Some("  "), false, &mut prompt)
            .expect_err("missing token");
        assert_missing(error);
        assert!(prompt.asked.is_empty());
    }
}
