use anyhow::Result;
use cliclack::{input, spinner};
use console::style;
use dismantle::config::Settings;
use dismantle::factory::agent_client;
use dismantle::models::session::Session;
use dismantle::presenter::{present_transcript, MarkdownPresenter};

use crate::render::{print_error, print_markdown};

enum ChatInput {
    Exit,
    Clear,
    Transcript,
    Prompt(String),
}

fn parse_input(text: &str) -> Option<ChatInput> {
    let text = text.trim();
    if text.is_empty() {
        None
    } else if text.eq_ignore_ascii_case("exit") || text.eq_ignore_ascii_case("/exit") {
        Some(ChatInput::Exit)
    } else if text.eq_ignore_ascii_case("/clear") {
        Some(ChatInput::Clear)
    } else if text.eq_ignore_ascii_case("/history") {
        Some(ChatInput::Transcript)
    } else {
        Some(ChatInput::Prompt(text.to_string()))
    }
}

pub async fn execute(settings: &Settings, session_id: Option<String>) -> Result<()> {
    let client = agent_client(settings)?;
    let mut session = match session_id {
        Some(id) => Session::with_id(id),
        None => Session::new(),
    };

    println!(
        "Chat with DISMANTLE AI {}",
        style("- type \"exit\" to end, \"/clear\" to start over, \"/history\" to replay").dim()
    );
    println!();

    loop {
        let message_text: String = input("Message:").placeholder("").interact()?;

        match parse_input(&message_text) {
            None => continue,
            Some(ChatInput::Exit) => break,
            Some(ChatInput::Clear) => {
                session.clear();
                println!("{}", style("Started a new conversation").dim());
            }
            Some(ChatInput::Transcript) => {
                let mut presenter = MarkdownPresenter::new();
                present_transcript(&session, &mut presenter);
                print_markdown(&presenter.finish())?;
            }
            Some(ChatInput::Prompt(prompt)) => {
                let spin = spinner();
                spin.start("awaiting reply");
                let response = client.converse(&mut session, &prompt).await;
                spin.stop("");

                if response.success {
                    print_markdown(&response.message)?;
                } else {
                    print_error(&format!("Failed to get response: {}", response.message));
                }
            }
        }
    }
    Ok(())
}
