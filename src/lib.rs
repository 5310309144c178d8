//! A Lua-like scripting language: scanner, recursive-descent parser, and a
//! stack-based bytecode virtual machine.
//!
//! A thin `compile`/`run` surface over the real subsystems, split across
//! separate `scan`/`parse`/`compile` stages rather than one opaque entry
//! point — the compiler is a free function over an `ast::Block` rather
//! than a method on the VM itself.

#[cfg(test)]
mod test;

pub mod ast;
pub mod compiler;
pub mod error;
pub mod parser;
pub mod scanner;
pub mod vm;

pub use compiler::{compile as compile_block, CompiledProgram};
pub use error::Error;
pub use vm::value::Value;
pub use vm::StackVm;

/// Scans, parses, and compiles `source` into a runnable program, without
/// running it.
pub fn compile(source: &str) -> Result<CompiledProgram, Error> {
    let tokens = scanner::scan(source)?;
    let block = parser::parse(tokens)?;
    let program = compiler::compile(&block)?;
    Ok(program)
}

/// Compiles `source` and runs it as a top-level chunk, returning the
/// chunk's single result value.
pub fn run(source: &str) -> Result<Value, Error> {
    let program = compile(source)?;
    let mut vm = StackVm::new(program.code, program.num_globals);
    let result = vm.run(program.entry_pc, program.num_locals)?;
    Ok(result)
}
