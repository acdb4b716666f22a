use crate::ast::ClassDecl;
use crate::typechecker::{ClassTy, SymbolKind, TypeEnv};

use std::rc::Rc;

impl TypeEnv {
    /// Fields and methods are checked in a scope of their own, so method
    /// bodies see fields and sibling methods by plain name. A derived class
    /// starts from a copy of its base's members; there is no subtyping.
    pub fn check_class_declaration(&mut self, decl: &Rc<ClassDecl>) {
        let mut class = ClassTy {
            name: decl.name.clone(),
            ..Default::default()
        };

        if let Some((base_name, base_span)) = &decl.base {
            if self.expect_kind(base_name, SymbolKind::Class, base_span) {
                match self.get_class(base_name) {
                    Some(base) => {
                        class.fields = base.fields.clone();
                        class.methods = base.methods.clone();
                    }
                    None => {
                        self.error(base_span, format!("undefined base class '{}'", base_name));
                    }
                }
            }
        }

        self.check_redeclaration(&decl.name, SymbolKind::Class, &decl.span);
        // Placeholder so members may mention the class being declared
        self.insert_class_at(0, Rc::new(class.clone()));

        self.push_scope();
        for (name, ty) in &class.fields {
            self.insert_var(name.clone(), ty.clone());
        }
        for (name, sig) in &class.methods {
            self.insert_function(name.clone(), sig.clone());
        }

        for (index, field) in decl.fields.iter().enumerate() {
            let name = &field.decl.name;
            if decl.fields[..index].iter().any(|f| &f.decl.name == name) {
                self.error(
                    &field.span,
                    format!("duplicate field '{}' in class '{}'", name, decl.name),
                );
            }
            let ty = self.check_var_declaration(&field.decl, &field.span);
            class.methods.remove(name);
            class.fields.insert(name.clone(), ty);
        }

        let mut sigs = Vec::with_capacity(decl.methods.len());
        for (index, method) in decl.methods.iter().enumerate() {
            if decl.methods[..index].iter().any(|m| m.name == method.name) {
                self.error(
                    &method.span,
                    format!(
                        "duplicate method '{}' in class '{}'",
                        method.name, decl.name
                    ),
                );
            }
            let sig = self.function_signature(method);
            self.check_redeclaration(&method.name, SymbolKind::Function, &method.span);
            class.fields.remove(&method.name);
            class.methods.insert(method.name.clone(), sig.clone());
            self.insert_function(method.name.clone(), sig.clone());
            sigs.push(sig);
        }

        // the enclosing scope sits one out from the class scope
        self.insert_class_at(1, Rc::new(class));

        for (method, sig) in decl.methods.iter().zip(&sigs) {
            self.check_function_body(method, sig);
        }
        self.pop_scope();
    }
}
