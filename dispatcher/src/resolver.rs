//! Builds a handler's argument list from its parameter descriptors.
//!
//! Per parameter, in declaration order:
//! 1. override under the parameter's type key
//! 2. override under the parameter's name
//! 3. typed parameter: registry entry under the type key
//! 4. untyped parameter: registry entry under the name
//!
//! Resolution is strict: a typed parameter whose type key is missing from the registry fails with
//! [`RouteError::DependencyNotFound`] rather than falling back to its name, and an untyped
//! parameter whose name is missing fails the same way. A null entry counts as present.

use telecore_core::{Container, Dependency, Registry, Result, RouteError};

use crate::handler::{Args, Handler, Param};

/// Resolves every parameter of `handler`. Reads `registry` and `overrides`, mutates neither.
pub fn resolve<R: Registry + ?Sized>(
    registry: &R,
    handler: &Handler,
    overrides: &Container,
) -> Result<Args> {
    handler
        .params()
        .iter()
        .map(|param| resolve_param(registry, param, overrides))
        .collect()
}

fn resolve_param<R: Registry + ?Sized>(
    registry: &R,
    param: &Param,
    overrides: &Container,
) -> Result<Dependency> {
    if let Some(value) = param.type_key().and_then(|key| overrides.lookup(key)) {
        return Ok(value.clone());
    }
    if let Some(value) = overrides.lookup(param.name()) {
        return Ok(value.clone());
    }

    let key = param.type_key().unwrap_or(param.name());
    registry.get(key).map_err(|_| RouteError::DependencyNotFound {
        param: param.name().to_string(),
        key: key.to_string(),
    })
}
