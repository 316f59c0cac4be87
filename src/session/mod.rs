//! Drives a conversation: a scripted batch of queries, then a stdin read loop.

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::core::error::AgentError;
use crate::domain::{Agent, Message};

pub const READY_BANNER: &str = "🚀 Nimiq MCP Agent Ready!\n";
pub const INTERACTIVE_BANNER: &str = "\n🔄 Entering interactive mode. Type 'exit' to quit.\n";
pub const PROMPT: &str = "You: ";
pub const GOODBYE: &str = "\n👋 Goodbye!";

const EXIT_WORDS: [&str; 3] = ["exit", "quit", "q"];

/// Why the interactive loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
    ExitCommand,
    EndOfInput,
}

pub fn is_exit_command(line: &str) -> bool {
    let normalized = line.trim().to_lowercase();
    EXIT_WORDS.contains(&normalized.as_str())
}

async fn emit<W: AsyncWrite + Unpin>(out: &mut W, text: &str) -> Result<(), AgentError> {
    out.write_all(text.as_bytes()).await?;
    out.flush().await?;
    Ok(())
}

/// Send each query as its own single-turn message, in order, printing the
/// query before the response. The first failure stops the batch.
pub async fn run_scripted_queries<A, W>(
    agent: &A,
    queries: &[String],
    out: &mut W,
) -> Result<usize, AgentError>
where
    A: Agent + ?Sized,
    W: AsyncWrite + Unpin,
{
    for (i, query) in queries.iter().enumerate() {
        emit(out, &format!("📝 Query: {query}\n")).await?;
        tracing::debug!(agent_id = agent.id(), index = i, "scripted query");
        let response = agent.run(&[Message::user(query.as_str())]).await?;
        emit(out, &format!("💬 Response: {}\n\n", response.content)).await?;
        emit(out, &format!("{}\n\n", "-".repeat(80))).await?;
    }
    Ok(queries.len())
}

/// Read lines until an exit word or end of input, answering every non-empty line.
pub async fn run_interactive_loop<A, R, W>(
    agent: &A,
    input: R,
    out: &mut W,
) -> Result<LoopExit, AgentError>
where
    A: Agent + ?Sized,
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    emit(out, &format!("{INTERACTIVE_BANNER}\n")).await?;
    let mut lines = input.lines();
    let exit = loop {
        emit(out, PROMPT).await?;
        let Some(line) = lines.next_line().await? else {
            break LoopExit::EndOfInput;
        };
        let line = line.trim();
        if is_exit_command(line) {
            break LoopExit::ExitCommand;
        }
        if line.is_empty() {
            continue;
        }
        let response = agent.run(&[Message::user(line)]).await?;
        emit(out, &format!("Agent: {}\n\n", response.content)).await?;
    };
    tracing::debug!(agent_id = agent.id(), reason = ?exit, "interactive loop finished");
    emit(out, &format!("{GOODBYE}\n")).await?;
    Ok(exit)
}
