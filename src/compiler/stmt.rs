//! Statement codegen: blocks, control flow, assignment, and the local/
//! function-definition forms that declare names.

use crate::ast::{Block, FunctionName, FunctionThunk, PrefixExpr, Stat};
use crate::error::CompileError;
use crate::vm::code::Instruction;
use crate::vm::value::{Address, Value};

use super::Compiler;

impl Compiler {
    pub(super) fn compile_block(&mut self, block: &Block) -> Result<(), CompileError> {
        for stat in &block.statements {
            self.compile_stat(stat)?;
        }
        if let Some(last) = &block.laststat {
            self.compile_stat(last)?;
        }
        Ok(())
    }

    fn compile_stat(&mut self, stat: &Stat) -> Result<(), CompileError> {
        match stat {
            Stat::Block(b) => {
                self.enter_scope();
                self.compile_block(b)?;
                self.exit_scope();
            }
            Stat::Assign {
                targets, values, ..
            } => self.compile_assign(targets, values)?,
            Stat::FunctionCallStat { call, .. } => {
                self.compile_prefix_expr(call)?;
                self.emit(Instruction::Pop);
            }
            Stat::Do { body, .. } => {
                self.enter_scope();
                self.compile_block(body)?;
                self.exit_scope();
            }
            Stat::While { cond, body, .. } => self.compile_while(cond, body)?,
            Stat::Repeat { body, cond, .. } => self.compile_repeat(body, cond)?,
            Stat::If {
                cond_blocks,
                else_block,
                ..
            } => self.compile_if(cond_blocks, else_block.as_ref())?,
            Stat::For {
                name,
                start,
                stop,
                step,
                body,
                ..
            } => self.compile_numeric_for(name, start, stop, step.as_ref(), body)?,
            Stat::ForIn {
                names, exprs, body, ..
            } => self.compile_generic_for(names, exprs, body)?,
            Stat::FunctionDef { name, body, .. } => self.compile_function_def(name, body)?,
            Stat::LocalFunction { name, body, .. } => self.compile_local_function(name, body)?,
            Stat::LocalVars { names, values, .. } => self.compile_local_vars(names, values)?,
            Stat::Return { values, .. } => self.compile_return(values)?,
            Stat::Break { position } => {
                let idx = self.emit_branch_placeholder(Instruction::Branch);
                self.func()
                    .record_break(idx)
                    .map_err(|()| CompileError {
                        message: "'break' outside a loop".to_string(),
                        position: *position,
                    })?;
            }
            Stat::Goto { label, position } => self.record_goto(label.clone(), *position),
            Stat::Label { name, .. } => self.record_label(name.clone()),
        }
        Ok(())
    }

    fn compile_assign(
        &mut self,
        targets: &[PrefixExpr],
        values: &[crate::ast::Expr],
    ) -> Result<(), CompileError> {
        let mut temp_slots = Vec::with_capacity(targets.len());
        for (i, _) in targets.iter().enumerate() {
            if i < values.len() {
                self.compile_expr(&values[i])?;
            } else {
                self.emit_const(Value::Nil);
            }
            let slot = self.func().declare_local("(assign)");
            self.emit_store_local(slot);
            temp_slots.push(slot);
        }
        for extra in &values[targets.len().min(values.len())..] {
            self.compile_expr(extra)?;
            self.emit(Instruction::Pop);
        }
        for (target, slot) in targets.iter().zip(temp_slots) {
            self.emit_load_local(slot);
            self.compile_assign_target(target)?;
        }
        Ok(())
    }

    /// Stores the value already on top of the operand stack into `target`.
    fn compile_assign_target(&mut self, target: &PrefixExpr) -> Result<(), CompileError> {
        match target {
            PrefixExpr::Name(name, _) => {
                self.store_into_name(name);
                Ok(())
            }
            PrefixExpr::Field { base, name, .. } => {
                let vslot = self.func().declare_local("(store)");
                self.emit_store_local(vslot);
                self.compile_prefix_expr(base)?;
                self.emit_const(Value::string(name.as_str()));
                self.emit_load_local(vslot);
                self.emit(Instruction::SetInTable);
                Ok(())
            }
            PrefixExpr::Index { base, key, .. } => {
                let vslot = self.func().declare_local("(store)");
                self.emit_store_local(vslot);
                self.compile_prefix_expr(base)?;
                self.compile_expr(key)?;
                self.emit_load_local(vslot);
                self.emit(Instruction::SetInTable);
                Ok(())
            }
            PrefixExpr::Paren(_, position)
            | PrefixExpr::FunctionCallExpr { position, .. }
            | PrefixExpr::MethodCall { position, .. } => Err(CompileError {
                message: "cannot assign to this expression".to_string(),
                position: *position,
            }),
        }
    }

    pub(super) fn store_into_name(&mut self, name: &str) {
        match self.resolve_name(name) {
            super::NameRef::Local(slot) => self.emit_store_local(slot),
            super::NameRef::Upvalue(idx) => {
                self.emit_const(Value::Index(idx as u64));
                self.emit(Instruction::StoreUpvalue);
            }
            super::NameRef::Global(slot) => {
                self.emit_const(Value::Index(slot as u64));
                self.emit(Instruction::StoreGlobal);
            }
        }
    }

    fn compile_while(&mut self, cond: &crate::ast::Expr, body: &Block) -> Result<(), CompileError> {
        let loop_start = self.current_addr() as Address;
        self.compile_expr(cond)?;
        let exit_patch = self.emit_branch_placeholder(Instruction::BranchIfFalse);

        self.func().enter_loop();
        self.enter_scope();
        self.compile_block(body)?;
        self.exit_scope();

        let back_patch = self.emit_branch_placeholder(Instruction::Branch);
        self.patch_address(back_patch, loop_start);

        let end_addr = self.current_addr() as Address;
        self.patch_address(exit_patch, end_addr);
        for site in self.func().exit_loop() {
            self.patch_address(site, end_addr);
        }
        Ok(())
    }

    fn compile_repeat(&mut self, body: &Block, cond: &crate::ast::Expr) -> Result<(), CompileError> {
        let loop_start = self.current_addr() as Address;
        self.func().enter_loop();
        self.enter_scope();
        self.compile_block(body)?;
        // `until`'s condition is evaluated inside the body's own scope, so
        // it can see locals the body declared.
        self.compile_expr(cond)?;
        self.exit_scope();

        let back_patch = self.emit_branch_placeholder(Instruction::BranchIfFalse);
        self.patch_address(back_patch, loop_start);

        let end_addr = self.current_addr() as Address;
        for site in self.func().exit_loop() {
            self.patch_address(site, end_addr);
        }
        Ok(())
    }

    fn compile_if(
        &mut self,
        cond_blocks: &[(crate::ast::Expr, Block)],
        else_block: Option<&Block>,
    ) -> Result<(), CompileError> {
        let mut end_patches = Vec::new();
        let mut pending_false_patch: Option<usize> = None;

        for (i, (cond, body)) in cond_blocks.iter().enumerate() {
            if let Some(p) = pending_false_patch.take() {
                let addr = self.current_addr() as Address;
                self.patch_address(p, addr);
            }
            self.compile_expr(cond)?;
            let false_patch = self.emit_branch_placeholder(Instruction::BranchIfFalse);

            self.enter_scope();
            self.compile_block(body)?;
            self.exit_scope();

            if i + 1 < cond_blocks.len() || else_block.is_some() {
                end_patches.push(self.emit_branch_placeholder(Instruction::Branch));
            }
            pending_false_patch = Some(false_patch);
        }

        if let Some(else_b) = else_block {
            if let Some(p) = pending_false_patch.take() {
                let addr = self.current_addr() as Address;
                self.patch_address(p, addr);
            }
            self.enter_scope();
            self.compile_block(else_b)?;
            self.exit_scope();
        } else if let Some(p) = pending_false_patch.take() {
            let addr = self.current_addr() as Address;
            self.patch_address(p, addr);
        }

        let end_addr = self.current_addr() as Address;
        for p in end_patches {
            self.patch_address(p, end_addr);
        }
        Ok(())
    }

    /// Ascending when `step > 0`, descending when `step < 0`, matching real
    /// Lua's `for` direction rule. Both branches of the direction test are
    /// computed eagerly with `Conjunction`/`Disjunction` rather than
    /// short-circuited, consistent with how `and`/`or` compile.
    fn compile_numeric_for(
        &mut self,
        name: &str,
        start: &crate::ast::Expr,
        stop: &crate::ast::Expr,
        step: Option<&crate::ast::Expr>,
        body: &Block,
    ) -> Result<(), CompileError> {
        self.enter_scope();
        let var_slot = self.func().declare_local(name);
        let limit_slot = self.func().declare_local("(for-limit)");
        let step_slot = self.func().declare_local("(for-step)");

        self.compile_expr(start)?;
        self.emit_store_local(var_slot);
        self.compile_expr(stop)?;
        self.emit_store_local(limit_slot);
        match step {
            Some(e) => self.compile_expr(e)?,
            None => {
                self.emit_const(Value::Number(1.0));
            }
        }
        self.emit_store_local(step_slot);

        let loop_start = self.current_addr() as Address;

        self.emit_load_local(step_slot);
        self.emit_const(Value::Number(0.0));
        self.emit(Instruction::Gt);
        self.emit_load_local(var_slot);
        self.emit_load_local(limit_slot);
        self.emit(Instruction::Le);
        self.emit(Instruction::Conjunction);

        self.emit_load_local(step_slot);
        self.emit_const(Value::Number(0.0));
        self.emit(Instruction::Le);
        self.emit_load_local(var_slot);
        self.emit_load_local(limit_slot);
        self.emit(Instruction::Ge);
        self.emit(Instruction::Conjunction);

        self.emit(Instruction::Disjunction);
        let exit_patch = self.emit_branch_placeholder(Instruction::BranchIfFalse);

        self.func().enter_loop();
        self.compile_block(body)?;

        self.emit_load_local(var_slot);
        self.emit_load_local(step_slot);
        self.emit(Instruction::Add);
        self.emit_store_local(var_slot);

        let back_patch = self.emit_branch_placeholder(Instruction::Branch);
        self.patch_address(back_patch, loop_start);

        let end_addr = self.current_addr() as Address;
        self.patch_address(exit_patch, end_addr);
        for site in self.func().exit_loop() {
            self.patch_address(site, end_addr);
        }
        self.exit_scope();
        Ok(())
    }

    /// Reduced generic `for`: iterates the positional (array-part) keys of
    /// a single table expression in order, via `CheckIfTableHas`'s natural
    /// border stop rather than a full iterator-function protocol — this
    /// VM's single-return-value ABI has no way to carry the usual
    /// `(iterator, state, control)` triple a real `for in` needs
    /// (documented in `DESIGN.md`). `names[0]` receives the integer key,
    /// `names[1]` (if present) the value; further names receive `nil`.
    fn compile_generic_for(
        &mut self,
        names: &[String],
        exprs: &[crate::ast::Expr],
        body: &Block,
    ) -> Result<(), CompileError> {
        self.enter_scope();
        let table_slot = self.func().declare_local("(for-table)");
        let index_slot = self.func().declare_local("(for-index)");

        match exprs.first() {
            Some(e) => self.compile_expr(e)?,
            None => {
                self.emit_const(Value::Nil);
            }
        }
        self.emit_store_local(table_slot);
        self.emit_const(Value::Number(0.0));
        self.emit_store_local(index_slot);

        let name_slots: Vec<usize> = names
            .iter()
            .map(|n| self.func().declare_local(n))
            .collect();

        let loop_start = self.current_addr() as Address;
        self.emit_load_local(index_slot);
        self.emit_const(Value::Number(1.0));
        self.emit(Instruction::Add);
        self.emit_store_local(index_slot);

        self.emit_load_local(table_slot);
        self.emit_load_local(index_slot);
        self.emit(Instruction::CheckIfTableHas);
        let exit_patch = self.emit_branch_placeholder(Instruction::BranchIfFalse);

        if let Some(&k_slot) = name_slots.first() {
            self.emit_load_local(index_slot);
            self.emit_store_local(k_slot);
        }
        if let Some(&v_slot) = name_slots.get(1) {
            self.emit_load_local(table_slot);
            self.emit_load_local(index_slot);
            self.emit(Instruction::GetFromTable);
            self.emit_store_local(v_slot);
        }
        for &extra_slot in name_slots.iter().skip(2) {
            self.emit_const(Value::Nil);
            self.emit_store_local(extra_slot);
        }

        self.func().enter_loop();
        self.compile_block(body)?;

        let back_patch = self.emit_branch_placeholder(Instruction::Branch);
        self.patch_address(back_patch, loop_start);

        let end_addr = self.current_addr() as Address;
        self.patch_address(exit_patch, end_addr);
        for site in self.func().exit_loop() {
            self.patch_address(site, end_addr);
        }
        self.exit_scope();
        Ok(())
    }

    fn compile_function_def(
        &mut self,
        name: &FunctionName,
        body: &FunctionThunk,
    ) -> Result<(), CompileError> {
        let (entry_pc, end_pc, num_locals, upvalues) =
            self.compile_function_body(&body.params, body.is_varargs, &body.body)?;

        if name.path.len() == 1 && name.method.is_none() {
            self.emit_make_closure(
                body.params.len() as u64,
                num_locals,
                body.is_varargs,
                entry_pc,
                end_pc,
                &upvalues,
            );
            self.store_into_name(&name.path[0]);
            return Ok(());
        }

        self.emit_make_closure(
            body.params.len() as u64,
            num_locals,
            body.is_varargs,
            entry_pc,
            end_pc,
            &upvalues,
        );
        let closure_slot = self.func().declare_local("(def)");
        self.emit_store_local(closure_slot);

        self.compile_name_load(&name.path[0])?;
        let nav_end = if name.method.is_some() {
            name.path.len()
        } else {
            name.path.len() - 1
        };
        for part in &name.path[1..nav_end] {
            self.emit_const(Value::string(part.as_str()));
            self.emit(Instruction::GetFromTable);
        }
        let final_key = name
            .method
            .clone()
            .unwrap_or_else(|| name.path[name.path.len() - 1].clone());
        self.emit_const(Value::string(final_key.as_str()));
        self.emit_load_local(closure_slot);
        self.emit(Instruction::SetInTable);
        Ok(())
    }

    fn compile_local_function(
        &mut self,
        name: &str,
        body: &FunctionThunk,
    ) -> Result<(), CompileError> {
        // Declared before the body compiles so the function can recurse
        // through its own name.
        let slot = self.func().declare_local(name);
        let (entry_pc, end_pc, num_locals, upvalues) =
            self.compile_function_body(&body.params, body.is_varargs, &body.body)?;
        self.emit_make_closure(
            body.params.len() as u64,
            num_locals,
            body.is_varargs,
            entry_pc,
            end_pc,
            &upvalues,
        );
        self.emit_store_local(slot);
        Ok(())
    }

    fn compile_local_vars(
        &mut self,
        names: &[String],
        values: &[crate::ast::Expr],
    ) -> Result<(), CompileError> {
        for (i, _) in names.iter().enumerate() {
            if i < values.len() {
                self.compile_expr(&values[i])?;
            } else {
                self.emit_const(Value::Nil);
            }
        }
        for extra in &values[names.len().min(values.len())..] {
            self.compile_expr(extra)?;
            self.emit(Instruction::Pop);
        }
        let slots: Vec<usize> = names.iter().map(|n| self.func().declare_local(n)).collect();
        for &slot in slots.iter().rev() {
            self.emit_store_local(slot);
        }
        Ok(())
    }

    fn compile_return(&mut self, values: &[crate::ast::Expr]) -> Result<(), CompileError> {
        match values.first() {
            Some(first) => self.compile_expr(first)?,
            None => {
                self.emit_const(Value::Nil);
            }
        }
        for extra in values.iter().skip(1) {
            self.compile_expr(extra)?;
            self.emit(Instruction::Pop);
        }
        self.emit(Instruction::ReturnFromClosure);
        Ok(())
    }
}
