pub mod completion;
pub mod config;
pub mod repl;
pub mod run;
