//! Expression codegen. Every expression form compiles to code that leaves
//! exactly one operand-stack value on top — calls carry a single
//! return/result value, never a tuple.

use crate::ast::{BinOp, Expr, Factor, PrefixExpr, Table, TableField, UnOp};
use crate::error::CompileError;
use crate::vm::code::Instruction;
use crate::vm::value::Value;

use super::{Compiler, NameRef};

impl Compiler {
    pub(super) fn compile_expr(&mut self, expr: &Expr) -> Result<(), CompileError> {
        match expr {
            Expr::Factor(f) => self.compile_factor(f),
            Expr::FunctionThunk(thunk) => {
                let (entry_pc, end_pc, num_locals, upvalues) =
                    self.compile_function_body(&thunk.params, thunk.is_varargs, &thunk.body)?;
                self.emit_make_closure(
                    thunk.params.len() as u64,
                    num_locals,
                    thunk.is_varargs,
                    entry_pc,
                    end_pc,
                    &upvalues,
                );
                Ok(())
            }
            Expr::Binary { op, lhs, rhs, .. } => self.compile_binary(*op, lhs, rhs),
            Expr::Unary { op, rhs, .. } => self.compile_unary(*op, rhs),
        }
    }

    fn compile_binary(&mut self, op: BinOp, lhs: &Expr, rhs: &Expr) -> Result<(), CompileError> {
        self.compile_expr(lhs)?;
        self.compile_expr(rhs)?;
        let instr = match op {
            BinOp::Or => Instruction::Disjunction,
            BinOp::And => Instruction::Conjunction,
            BinOp::Lt => Instruction::Lt,
            BinOp::Le => Instruction::Le,
            BinOp::Gt => Instruction::Gt,
            BinOp::Ge => Instruction::Ge,
            BinOp::Eq => Instruction::Eq,
            BinOp::Ne => Instruction::Ne,
            BinOp::Concat => Instruction::ConcatString,
            BinOp::Add => Instruction::Add,
            BinOp::Sub => Instruction::Sub,
            BinOp::Mul => Instruction::Mul,
            BinOp::Div => Instruction::Div,
            BinOp::FloorDiv => Instruction::FloorReal,
            BinOp::Mod => Instruction::Mod,
            BinOp::Pow => Instruction::FPow,
            BinOp::BitAnd => Instruction::BitwiseAnd,
            BinOp::BitOr => Instruction::BitwiseOr,
            BinOp::BitXor => Instruction::BitwiseXor,
            BinOp::Shl => Instruction::BitwiseShiftLeft,
            BinOp::Shr => Instruction::BitwiseShiftRight,
        };
        self.emit(instr);
        Ok(())
    }

    /// `and`/`or` are lowered as eager, non-short-circuiting evaluations:
    /// both operands are always computed, and `Conjunction`/`Disjunction`
    /// pick the correct Lua-valued result from the two. A short-circuiting
    /// compiler would branch around the right-hand side instead; this repo
    /// keeps the simpler eager form since `Conjunction`/`Disjunction` exist
    /// as dedicated instructions precisely to do the picking (see
    /// `vm/dispatcher`), and documents the side-effect-ordering difference
    /// in `DESIGN.md`.
    fn compile_unary(&mut self, op: UnOp, rhs: &Expr) -> Result<(), CompileError> {
        self.compile_expr(rhs)?;
        let instr = match op {
            UnOp::Neg => Instruction::Negate,
            UnOp::Not => Instruction::Not,
            UnOp::BitNot => Instruction::BitwiseNot,
            UnOp::Len => Instruction::TableLength,
        };
        self.emit(instr);
        Ok(())
    }

    fn compile_factor(&mut self, factor: &Factor) -> Result<(), CompileError> {
        match factor {
            Factor::Nil(_) => {
                self.emit_const(Value::Nil);
            }
            Factor::Boolean(b, _) => {
                self.emit_const(Value::Boolean(*b));
            }
            Factor::Number(n, _) => {
                self.emit_const(Value::Number(*n));
            }
            Factor::String(s, _) => {
                self.emit_const(Value::string(s.as_str()));
            }
            Factor::Varargs(_) => {
                // Varargs carry no multi-value representation in this VM's
                // single-return ABI; `...` used as a value evaluates to nil.
                self.emit_const(Value::Nil);
            }
            Factor::NestedExpr(inner, _) => self.compile_expr(inner)?,
            Factor::Table(t) => self.compile_table(t)?,
            Factor::Prefix(p) => self.compile_prefix_expr(p)?,
        }
        Ok(())
    }

    /// Builds the table via a hidden local holding the in-progress `Table`
    /// value, reloaded before each field insert and left on the stack once
    /// more as the constructor's result.
    fn compile_table(&mut self, table: &Table) -> Result<(), CompileError> {
        self.emit(Instruction::NewTable);
        let table_slot = self.func().declare_local("(table)");
        self.emit_store_local(table_slot);

        let mut next_index = 1i64;
        for field in &table.fields {
            self.emit_load_local(table_slot);
            match field {
                TableField::Positional(value) => {
                    self.emit_const(Value::Number(next_index as f64));
                    self.compile_expr(value)?;
                    next_index += 1;
                }
                TableField::Named(name, value) => {
                    self.emit_const(Value::string(name.as_str()));
                    self.compile_expr(value)?;
                }
                TableField::Bracketed(key, value) => {
                    self.compile_expr(key)?;
                    self.compile_expr(value)?;
                }
            }
            self.emit(Instruction::InsertIntoTable);
        }

        self.emit_load_local(table_slot);
        Ok(())
    }

    pub(super) fn compile_prefix_expr(&mut self, expr: &PrefixExpr) -> Result<(), CompileError> {
        match expr {
            PrefixExpr::Name(name, _) => self.compile_name_load(name),
            PrefixExpr::Paren(inner, _) => self.compile_expr(inner)?,
            PrefixExpr::Field { base, name, .. } => {
                self.compile_prefix_expr(base)?;
                self.emit_const(Value::string(name.as_str()));
                self.emit(Instruction::GetFromTable);
            }
            PrefixExpr::Index { base, key, .. } => {
                self.compile_prefix_expr(base)?;
                self.compile_expr(key)?;
                self.emit(Instruction::GetFromTable);
            }
            PrefixExpr::FunctionCallExpr { callee, args, .. } => {
                self.compile_call(callee, args, None)?;
            }
            PrefixExpr::MethodCall {
                base, method, args, ..
            } => {
                self.compile_call(base, args, Some(method))?;
            }
        }
        Ok(())
    }

    pub(super) fn compile_name_load(&mut self, name: &str) -> Result<(), CompileError> {
        match self.resolve_name(name) {
            NameRef::Local(slot) => self.emit_load_local(slot),
            NameRef::Upvalue(idx) => {
                self.emit_const(Value::Index(idx as u64));
                self.emit(Instruction::LoadUpvalue);
            }
            NameRef::Global(slot) => {
                self.emit_const(Value::Index(slot as u64));
                self.emit(Instruction::LoadGlobal);
            }
        }
        Ok(())
    }

    /// `callee(args)`, or for a method call `base:method(args)` — Lua's
    /// desugaring of `:` into passing `base` as the implicit first
    /// argument. The calling convention this VM uses pushes arguments
    /// first, then the argument count, then the callee `Closure` value
    /// last, so `CallClosure` can pop the closure and count straight off
    /// the top (see `call_frame.rs`); `self`/the callee are staged through
    /// hidden locals so they can be reloaded after the argument list
    /// without a dedicated stack-shuffle instruction.
    fn compile_call(
        &mut self,
        base: &PrefixExpr,
        args: &[Expr],
        method: Option<&str>,
    ) -> Result<(), CompileError> {
        let self_slot = if let Some(method) = method {
            self.compile_prefix_expr(base)?;
            let slot = self.func().declare_local("(self)");
            self.emit_store_local(slot);
            self.emit_load_local(slot);
            self.emit_const(Value::string(method));
            self.emit(Instruction::GetFromTable);
            Some(slot)
        } else {
            self.compile_prefix_expr(base)?;
            None
        };
        let callee_slot = self.func().declare_local("(callee)");
        self.emit_store_local(callee_slot);

        let mut num_args = 0u64;
        if let Some(slot) = self_slot {
            self.emit_load_local(slot);
            num_args += 1;
        }
        for arg in args {
            self.compile_expr(arg)?;
            num_args += 1;
        }
        self.emit_const(Value::Index(num_args));
        self.emit_load_local(callee_slot);
        self.emit(Instruction::CallClosure);
        Ok(())
    }

    pub(super) fn emit_load_local(&mut self, slot: usize) {
        self.emit_const(Value::Index(slot as u64));
        self.emit(Instruction::LoadLocal);
    }

    pub(super) fn emit_store_local(&mut self, slot: usize) {
        self.emit_const(Value::Index(slot as u64));
        self.emit(Instruction::StoreLocal);
    }
}
