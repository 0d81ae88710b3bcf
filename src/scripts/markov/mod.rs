//! Self-learning Markov chain responder.

pub mod builder;
pub mod engine;
pub mod store;
pub mod table;

pub use builder::{build_table, decode_chat_log, learn_corpus, CorpusStats};
pub use engine::{is_known_bot, is_mostly_english, split_words, MarkovEngine};
pub use store::BrainStore;
pub use table::TransitionTable;
