mod common;
mod evaluation;
mod explain;
mod matcher;
