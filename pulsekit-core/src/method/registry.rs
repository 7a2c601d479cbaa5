use extraction::{Gating, MethodDecl, MethodFn, MethodSource, ParamSpec};
use std::collections::BTreeMap;

pub struct RegisteredMethod {
    pub name: String,
    pub gating: Gating,
    pub params: Vec<ParamSpec>,
    pub func: MethodFn,
}

/// Two independent name-to-method maps, one per gating class. Populated
/// once at activation; entries are never removed during a session.
#[derive(Default)]
pub struct MethodRegistry {
    gated: BTreeMap<String, RegisteredMethod>,
    ungated: BTreeMap<String, RegisteredMethod>,
    diagnostics: Vec<String>,
}

impl MethodRegistry {
    /// Builds the registry from the given sources in order. A malformed
    /// candidate is skipped with a diagnostic; when two sources declare
    /// the same raw name the last one wins.
    pub fn discover(sources: &[&dyn MethodSource]) -> Self {
        let mut registry = Self::default();
        for source in sources {
            for decl in source.method_decls() {
                match validate_decl(&decl) {
                    Ok((gating, name)) => {
                        let method = RegisteredMethod {
                            name: name.to_string(),
                            gating,
                            params: decl.params.to_vec(),
                            func: decl.func,
                        };
                        registry.map_mut(gating).insert(name.to_string(), method);
                    }
                    Err(reason) => {
                        let message = format!(
                            "Could not register extraction method candidate '{}' from source '{}': {}",
                            decl.raw_name,
                            source.source_name(),
                            reason
                        );
                        log::error!("{message}");
                        registry.diagnostics.push(message);
                    }
                }
            }
        }
        registry
    }

    pub fn get(&self, gating: Gating, name: &str) -> Option<&RegisteredMethod> {
        self.map(gating).get(name)
    }

    pub fn contains(&self, gating: Gating, name: &str) -> bool {
        self.map(gating).contains_key(name)
    }

    pub fn method_names(&self, gating: Gating) -> Vec<&str> {
        self.map(gating).keys().map(String::as_str).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.gated.is_empty() && self.ungated.is_empty()
    }

    pub fn take_diagnostics(&mut self) -> Vec<String> {
        std::mem::take(&mut self.diagnostics)
    }

    fn map(&self, gating: Gating) -> &BTreeMap<String, RegisteredMethod> {
        match gating {
            Gating::Gated => &self.gated,
            Gating::Ungated => &self.ungated,
        }
    }

    fn map_mut(&mut self, gating: Gating) -> &mut BTreeMap<String, RegisteredMethod> {
        match gating {
            Gating::Gated => &mut self.gated,
            Gating::Ungated => &mut self.ungated,
        }
    }
}

fn validate_decl(decl: &MethodDecl) -> Result<(Gating, &'static str), String> {
    let Some((gating, name)) = Gating::split_raw_name(decl.raw_name) else {
        return Err("name carries neither a 'gated_' nor an 'ungated_' prefix".to_string());
    };
    if name.is_empty() {
        return Err("public name is empty after stripping the gating prefix".to_string());
    }
    for (index, spec) in decl.params.iter().enumerate() {
        if decl.params[..index].iter().any(|prior| prior.name == spec.name) {
            return Err(format!("parameter '{}' is declared twice", spec.name));
        }
    }
    Ok((gating, name))
}
