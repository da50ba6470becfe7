pub mod collector;
pub mod dmp;
pub mod errors;
pub mod gz_stream;
pub mod join;
pub mod output;
pub mod pipeline;
pub mod seqreader;
pub mod translation;
