//! Terminal chat client for a running ResearchQuery server.
//!
//! Lines are sent as chat messages; `:link <url>` ingests a document
//! first. Streamed answer fragments print as they arrive.

use std::env;
use std::io::Write;

use tokio::io::{AsyncBufReadExt, BufReader};

use researchquery_backend::controller::{Controller, HttpChatService, Submission, TranscriptSink};
use researchquery_backend::llm::{ChatMessage, Role};

struct ConsoleSink;

impl TranscriptSink for ConsoleSink {
    fn turn_added(&mut self, turn: &ChatMessage) {
        if turn.role != Role::Assistant {
            return;
        }
        if turn.content.is_empty() {
            // Streaming placeholder: fragments follow on this line.
            print!("assistant> ");
            let _ = std::io::stdout().flush();
        } else {
            println!("assistant> {}", turn.content);
        }
    }

    fn fragment_appended(&mut self, fragment: &str) {
        print!("{}", fragment);
        let _ = std::io::stdout().flush();
    }

    fn turn_replaced(&mut self, turn: &ChatMessage) {
        println!("{}", turn.content);
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let base_url = env::args()
        .nth(1)
        .or_else(|| env::var("RESEARCHQUERY_URL").ok())
        .unwrap_or_else(|| "http://127.0.0.1:8000".to_string());

    let mut controller = Controller::new(HttpChatService::new(&base_url));
    let mut sink = ConsoleSink;

    for turn in controller.transcript() {
        println!("assistant> {}", turn.content);
    }
    println!("(:link <url> ingests a page, :quit exits)");

    let stdin = BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();

    loop {
        print!("you> ");
        let _ = std::io::stdout().flush();

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim().to_string();

        if line == ":quit" || line == ":q" {
            break;
        }

        if let Some(url) = line.strip_prefix(":link") {
            if controller.submit_link(url.trim(), &mut sink).await == Submission::Rejected {
                println!("(nothing submitted)");
            }
            continue;
        }

        match controller.submit_message(&line, &mut sink).await {
            Submission::Accepted => println!(),
            Submission::Rejected => println!("(nothing submitted)"),
        }
    }

    Ok(())
}
