//! Runs [`Command`]s on a tokio runtime and reports [`Completion`]s back to
//! the UI thread.

use std::sync::Arc;

use shelftrack_application::{Command, Completion};
use tokio::runtime::Handle;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};

use crate::BookApi;

/// Spawns one task per command. Nothing is ever cancelled: a slow response is
/// delivered whenever it arrives.
#[derive(Clone)]
pub struct Executor {
    api: Arc<dyn BookApi>,
    runtime: Handle,
    completions: UnboundedSender<Completion>,
}

impl Executor {
    pub fn new(api: Arc<dyn BookApi>, runtime: Handle) -> (Self, UnboundedReceiver<Completion>) {
        let (completions, rx) = unbounded_channel();
        (
            Self {
                api,
                runtime,
                completions,
            },
            rx,
        )
    }

    pub fn submit(&self, command: Command) {
        let api = Arc::clone(&self.api);
        let completions = self.completions.clone();
        self.runtime.spawn(async move {
            let completion = execute(api.as_ref(), command).await;
            if completions.send(completion).is_err() {
                tracing::debug!("completion dropped: receiver closed");
            }
        });
    }

    pub fn submit_all(&self, commands: impl IntoIterator<Item = Command>) {
        for command in commands {
            self.submit(command);
        }
    }
}

pub async fn execute(api: &dyn BookApi, command: Command) -> Completion {
    match command {
        Command::LoadLibrary => Completion::LibraryLoaded(api.library().await),
        Command::AddBook { catalog_id, status } => {
            Completion::BookAdded(api.add_book(&catalog_id, status).await)
        }
        Command::MoveBook { book_id, status } => {
            let result = api.move_book(&book_id, status).await;
            Completion::BookMoved {
                book_id,
                status,
                result,
            }
        }
        Command::RemoveBook { book_id } => Completion::BookRemoved(api.remove_book(&book_id).await),
        Command::RateBook { book_id, rating } => {
            let result = api.rate_book(&book_id, rating).await;
            Completion::BookRated {
                book_id,
                rating,
                result,
            }
        }
        Command::Search { seq, query } => Completion::SearchFinished {
            seq,
            result: api.search(&query).await,
        },
        Command::FetchCover { url } => {
            let result = api.fetch_cover(&url).await;
            Completion::CoverFetched { url, result }
        }
    }
}
