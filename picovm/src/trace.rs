/// Enumerate the outgoing strong edges of a value. This is the hook a
/// collector's mark phase would drive; it is also useful on its own for
/// heap dumps and leak diagnostics.
///
/// Two kinds of slot are deliberately not edges: symbols, which live in
/// their own arena and are never reclaimed, and the link inside a WeakRef,
/// which must not keep its target alive. A WeakRef's finalizer callback is
/// a strong edge and is visited.
use crate::containers::SliceableContainer;
use crate::error::RuntimeError;
use crate::safeptr::{MutatorScope, TaggedScopedPtr};
use crate::taggedptr::Value;

pub fn trace<'guard, F>(
    guard: &'guard dyn MutatorScope,
    value: TaggedScopedPtr<'guard>,
    visit: &mut F,
) -> Result<(), RuntimeError>
where
    F: FnMut(TaggedScopedPtr<'guard>),
{
    match *value {
        // leaf values carry no references
        Value::None
        | Value::Bool(_)
        | Value::Int(_)
        | Value::Symbol(_)
        | Value::BigNum(_)
        | Value::Text(_)
        | Value::ArrayU8(_)
        | Value::Range(_) => (),

        Value::Tuple(tuple) => {
            tuple.each_item(guard, |item| visit(item.get(guard)));
        }

        Value::List(list) => {
            list.access_slice(guard, |items| {
                for item in items {
                    visit(item.get(guard));
                }
            });
        }

        Value::Set(set) => {
            set.each_member(guard, |member| visit(member.get(guard)))?;
        }

        Value::Dict(dict) => {
            dict.each_entry(guard, |key, val| {
                visit(key.get(guard));
                visit(val.get(guard));
            })?;
        }

        Value::SharedCell(cell) => {
            visit(cell.cell().get(guard));
        }

        Value::Function(function) => {
            visit(function.name_cell().get(guard));
            visit(function.code_cell().get(guard));
            visit(function.param_names(guard).as_tagged(guard));
        }

        Value::Closure(closure) => {
            visit(closure.function(guard).as_tagged(guard));
            visit(closure.cells(guard).as_tagged(guard));
        }

        Value::Generator(gen) => {
            visit(gen.function(guard).as_tagged(guard));
            visit(gen.stack(guard).as_tagged(guard));
            visit(gen.locals(guard).as_tagged(guard));
            visit(gen.result_cell().get(guard));
        }

        Value::Class(class) => {
            visit(class.attrs(guard).as_tagged(guard));
        }

        Value::Instance(instance) => {
            visit(instance.class(guard).as_tagged(guard));
            visit(instance.attrs(guard).as_tagged(guard));
        }

        Value::TupleIter(iter) => {
            visit(iter.source(guard).as_tagged(guard));
        }

        Value::ListIter(iter) => {
            visit(iter.source(guard).as_tagged(guard));
        }

        Value::RangeIter(iter) => {
            visit(iter.source(guard).as_tagged(guard));
        }

        Value::WeakRef(weak) => {
            // the link is skipped, only the callback is a strong edge
            visit(weak.callback_cell().get(guard));
        }
    }

    Ok(())
}
