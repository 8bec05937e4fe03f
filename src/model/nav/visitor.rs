//! Traversal algorithms over the five descriptor shapes.
//!
//! Three structural algorithms operate on [`TypeDesc`] trees, each an exhaustive match
//! so the compiler enforces coverage of every shape:
//!
//! - [`find_base`]: locate the instantiation of an ancestor class with the subtype's
//!   type arguments substituted in
//! - [`bind`]: replace bound type variables by actual arguments, preserving structural
//!   sharing (no new descriptor is allocated unless content differs)
//! - [`erase`]: strip generic information down to the nearest concrete raw type
//!
//! All hierarchy-walking entry points carry a depth guard so that malformed cyclic
//! declarations surface as [`crate::Error::RecursionLimit`] instead of exhausting the
//! stack.

use std::sync::Arc;

use crate::{
    model::{
        descriptor::{Builtin, ClassId, TypeDesc, TypeDescRc, TypeVarRc},
        nav::Navigator,
    },
    Result,
};

/// Maximum depth for hierarchy walks before assuming a malformed cycle.
pub(crate) const MAX_HIERARCHY_DEPTH: usize = 256;

fn check_depth(depth: usize) -> Result<()> {
    if depth > MAX_HIERARCHY_DEPTH {
        return Err(crate::Error::RecursionLimit(MAX_HIERARCHY_DEPTH));
    }
    Ok(())
}

/// Find the instantiation of `target` in the ancestry of `t`.
///
/// The superclass chain is searched before interfaces, depth-first. When the match is
/// found through a parameterized ancestor, every ancestor descriptor is first rebound
/// with the subtype's actual arguments, so the result carries concrete type arguments
/// rather than the ancestor's free variables. Type variables resolve through their
/// first bound; arrays and wildcards never match.
pub(crate) fn find_base<N: Navigator + ?Sized>(
    nav: &N,
    t: &TypeDescRc,
    target: ClassId,
    depth: usize,
) -> Result<Option<TypeDescRc>> {
    check_depth(depth)?;

    match &**t {
        TypeDesc::Class(c) => {
            if *c == target {
                return Ok(Some(t.clone()));
            }
            if let Some(sc) = nav.superclass(*c)? {
                if let Some(found) = find_base(nav, &sc, target, depth + 1)? {
                    return Ok(Some(found));
                }
            }
            for interface in nav.interfaces(*c)? {
                if let Some(found) = find_base(nav, &interface, target, depth + 1)? {
                    return Ok(Some(found));
                }
            }
            Ok(None)
        }
        TypeDesc::Parameterized { raw, args, .. } => {
            if *raw == target {
                return Ok(Some(t.clone()));
            }
            let params = nav.type_parameters(*raw)?;
            if let Some(sc) = nav.superclass(*raw)? {
                let bound = bind(&sc, &params, args)?;
                if let Some(found) = find_base(nav, &bound, target, depth + 1)? {
                    return Ok(Some(found));
                }
            }
            for interface in nav.interfaces(*raw)? {
                let bound = bind(&interface, &params, args)?;
                if let Some(found) = find_base(nav, &bound, target, depth + 1)? {
                    return Ok(Some(found));
                }
            }
            Ok(None)
        }
        TypeDesc::Array(_) | TypeDesc::Wildcard { .. } => Ok(None),
        TypeDesc::Variable(var) => {
            let bound = var.first_bound().unwrap_or_else(TypeDesc::object);
            find_base(nav, &bound, target, depth + 1)
        }
    }
}

/// Replace every variable of `params` occurring in `t` by the corresponding entry of
/// `args`; free variables pass through unchanged.
///
/// The original descriptor is returned whenever no nested type changed, so callers can
/// observe "nothing was rebuilt" through [`Arc::ptr_eq`]. Wildcard bounds are
/// substituted independently.
pub(crate) fn bind(
    t: &TypeDescRc,
    params: &[TypeVarRc],
    args: &[TypeDescRc],
) -> Result<TypeDescRc> {
    if params.len() != args.len() {
        return Err(shape_error!(
            "substitution with {} parameter(s) but {} argument(s)",
            params.len(),
            args.len()
        ));
    }

    match &**t {
        TypeDesc::Class(_) => Ok(t.clone()),
        TypeDesc::Parameterized { raw, args: actual, owner } => {
            let mut changed = false;
            let mut new_args = Vec::with_capacity(actual.len());
            for arg in actual {
                let bound = bind(arg, params, args)?;
                changed |= !Arc::ptr_eq(&bound, arg);
                new_args.push(bound);
            }
            let new_owner = match owner {
                Some(o) => {
                    let bound = bind(o, params, args)?;
                    changed |= !Arc::ptr_eq(&bound, o);
                    Some(bound)
                }
                None => None,
            };
            if !changed {
                return Ok(t.clone());
            }
            Ok(Arc::new(TypeDesc::Parameterized {
                raw: *raw,
                args: new_args,
                owner: new_owner,
            }))
        }
        TypeDesc::Array(component) => {
            let bound = bind(component, params, args)?;
            if Arc::ptr_eq(&bound, component) {
                return Ok(t.clone());
            }
            Ok(Arc::new(TypeDesc::Array(bound)))
        }
        TypeDesc::Variable(var) => {
            for (param, arg) in params.iter().zip(args) {
                if Arc::ptr_eq(param, var) {
                    return Ok(arg.clone());
                }
            }
            // free variable
            Ok(t.clone())
        }
        TypeDesc::Wildcard { lower, upper } => {
            let mut changed = false;
            let mut bind_all = |bounds: &[TypeDescRc]| -> Result<Vec<TypeDescRc>> {
                let mut out = Vec::with_capacity(bounds.len());
                for b in bounds {
                    let bound = bind(b, params, args)?;
                    changed |= !Arc::ptr_eq(&bound, b);
                    out.push(bound);
                }
                Ok(out)
            };
            let new_lower = bind_all(lower)?;
            let new_upper = bind_all(upper)?;
            if !changed {
                return Ok(t.clone());
            }
            Ok(Arc::new(TypeDesc::Wildcard {
                lower: new_lower,
                upper: new_upper,
            }))
        }
    }
}

/// Strip all generic information down to the nearest concrete raw type.
///
/// Parameterized types erase to their raw class, arrays to an array of the erased
/// component (shared when unchanged), type variables to the erasure of their first
/// bound, wildcards to the erasure of their first upper bound; both variable and
/// wildcard default to `Object` when no bound is present.
pub(crate) fn erase(t: &TypeDescRc, depth: usize) -> Result<TypeDescRc> {
    check_depth(depth)?;

    match &**t {
        TypeDesc::Class(_) => Ok(t.clone()),
        TypeDesc::Parameterized { raw, .. } => Ok(TypeDesc::class(*raw)),
        TypeDesc::Array(component) => {
            let erased = erase(component, depth + 1)?;
            if Arc::ptr_eq(&erased, component) {
                return Ok(t.clone());
            }
            Ok(Arc::new(TypeDesc::Array(erased)))
        }
        TypeDesc::Variable(var) => match var.first_bound() {
            Some(bound) => erase(&bound, depth + 1),
            None => Ok(TypeDesc::object()),
        },
        TypeDesc::Wildcard { upper, .. } => match upper.first() {
            Some(bound) => erase(bound, depth + 1),
            None => Ok(TypeDesc::object()),
        },
    }
}

/// True if `sup` occurs in the erased ancestry of `sub` (superclass chain and
/// interfaces, depth-first).
pub(crate) fn is_ancestor<N: Navigator + ?Sized>(
    nav: &N,
    sub: ClassId,
    sup: ClassId,
    depth: usize,
) -> Result<bool> {
    check_depth(depth)?;

    if sub == sup {
        return Ok(true);
    }
    if sup == Builtin::Object.class_id() {
        return Ok(true);
    }
    if let Some(sc) = nav.superclass(sub)? {
        if let Some(raw) = nav.erasure_class(&sc)? {
            if is_ancestor(nav, raw, sup, depth + 1)? {
                return Ok(true);
            }
        }
    }
    for interface in nav.interfaces(sub)? {
        if let Some(raw) = nav.erasure_class(&interface)? {
            if is_ancestor(nav, raw, sup, depth + 1)? {
                return Ok(true);
            }
        }
    }
    Ok(false)
}
