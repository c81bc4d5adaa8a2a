// Parser tests
mod parsing;
