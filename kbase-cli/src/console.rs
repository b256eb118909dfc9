//! Interactive shell.
//!
//! Lines starting with `/` are commands; anything else is a question.

use kbase_rag::{DocumentSource, KnowledgeSession, Role, SessionState};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing::warn;

const PROMPT: &str = "kbase> ";

/// Starter questions offered once documents are loaded.
pub const EXAMPLE_QUESTIONS: &[&str] = &[
    "What is the main topic of the document?",
    "Can you summarize the key points?",
    "What are the important details mentioned?",
    "How does this relate to the overall context?",
];

const HELP: &str = "\
Commands:
  /ingest <path>   add a PDF, .txt, .md or .docx file
  /url <url>       add a web page
  /docs            list loaded documents
  /history         show the conversation so far
  /examples        list example questions
  /example <n>     ask example question n
  /reset           forget all documents and delete the index
  /help            show this message
  /quit            exit
Anything else is asked as a question.";

/// A parsed line of input.
#[derive(Debug, PartialEq, Eq)]
enum Command {
    Ingest(String),
    Url(String),
    Docs,
    History,
    Examples,
    Example(usize),
    Reset,
    Help,
    Quit,
    Ask(String),
    Invalid(String),
    Empty,
}

impl Command {
    fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return Command::Empty;
        }
        let Some(rest) = line.strip_prefix('/') else {
            return Command::Ask(line.to_string());
        };

        let (name, arg) = match rest.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (rest, ""),
        };
        match (name.to_ascii_lowercase().as_str(), arg) {
            ("ingest" | "file", "") => Command::Invalid("/ingest needs a file path".into()),
            ("ingest" | "file", path) => Command::Ingest(path.to_string()),
            ("url" | "web", "") => Command::Invalid("/url needs a web address".into()),
            ("url" | "web", url) => Command::Url(url.to_string()),
            ("docs", _) => Command::Docs,
            ("history", _) => Command::History,
            ("examples", _) => Command::Examples,
            ("example", n) => match n.parse::<usize>() {
                Ok(n) if (1..=EXAMPLE_QUESTIONS.len()).contains(&n) => Command::Example(n),
                _ => Command::Invalid(format!(
                    "/example takes a number from 1 to {}",
                    EXAMPLE_QUESTIONS.len()
                )),
            },
            ("reset", _) => Command::Reset,
            ("help" | "?", _) => Command::Help,
            ("quit" | "exit" | "q", _) => Command::Quit,
            (other, _) => Command::Invalid(format!("unknown command /{other}; try /help")),
        }
    }
}

/// Ingest one source and report the result; failures never end the session.
pub async fn ingest(session: &mut KnowledgeSession, source: DocumentSource) {
    let label = source.label();
    match session.ingest(source).await {
        Ok(report) if report.documents_added == 0 => {
            println!("No text found in {label}; nothing added.");
        }
        Ok(report) => println!(
            "Added {} document(s) from {label}; {} chunks indexed.",
            report.documents_added, report.chunk_count
        ),
        Err(e) => {
            warn!(source = %label, error = %e, "ingest failed");
            println!("Could not add {label}: {e}");
        }
    }
}

fn print_documents(session: &KnowledgeSession) {
    let documents = session.documents();
    println!("Documents loaded: {}", documents.len());
    for (i, doc) in documents.iter().enumerate() {
        match doc.metadata.get(kbase_rag::document::PAGE_KEY) {
            Some(page) => println!("  {:>3}. {} (page {page})", i + 1, doc.source()),
            None => println!("  {:>3}. {}", i + 1, doc.source()),
        }
    }
}

fn print_history(session: &KnowledgeSession) {
    if session.history().is_empty() {
        println!("No questions asked yet.");
    }
    for message in session.history() {
        let who = match message.role {
            Role::User => "you",
            Role::Assistant => "kbase",
        };
        println!("{who}: {}\n", message.content);
    }
}

async fn ask(session: &mut KnowledgeSession, question: &str) {
    let outcome = session.ask(question).await;
    println!("{outcome}\n");
}

/// Run the read-eval-print loop until `/quit` or end of input.
pub async fn run(session: &mut KnowledgeSession) -> anyhow::Result<()> {
    let mut editor = DefaultEditor::new()?;
    println!("kbase: ask questions about your documents. Type /help for commands.");
    if session.state() == SessionState::Empty {
        println!("No documents loaded yet. Add one with /ingest <path> or /url <url>.");
    }

    loop {
        let line = match editor.readline(PROMPT) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        };
        if !line.trim().is_empty() {
            editor.add_history_entry(line.as_str())?;
        }

        match Command::parse(&line) {
            Command::Empty => {}
            Command::Ingest(path) => ingest(session, DocumentSource::parse(&path)).await,
            Command::Url(url) => ingest(session, DocumentSource::Url(url)).await,
            Command::Docs => print_documents(session),
            Command::History => print_history(session),
            Command::Examples => {
                for (i, question) in EXAMPLE_QUESTIONS.iter().enumerate() {
                    println!("  {}. {question}", i + 1);
                }
            }
            Command::Example(n) => {
                let question = EXAMPLE_QUESTIONS[n - 1];
                println!("you: {question}");
                ask(session, question).await;
            }
            Command::Reset => match session.reset().await {
                Ok(()) => println!("Knowledge base reset."),
                Err(e) => println!("Reset incomplete: {e}"),
            },
            Command::Help => println!("{HELP}"),
            Command::Quit => break,
            Command::Ask(question) => ask(session, &question).await,
            Command::Invalid(message) => println!("{message}"),
        }
    }
    Ok(())
}
