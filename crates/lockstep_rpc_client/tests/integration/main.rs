mod client;
mod replicated;
