use std::any::{Any, type_name};
use std::fmt::Display;
use std::sync::Arc;

use async_graphql::Context;
use async_graphql::dynamic::{Field, FieldFuture, FieldValue, TypeRef};

use super::args::{Arguments, ArgumentsDescriptor, QueryArgs, RootData};
use super::error::{GqlError, internal_error};
use super::ext::Named;
use super::reflect::{Plan, Reflect, TypeDescriptor};
use super::validator::Validator;
use crate::cnf::Config;

pub(crate) type FieldGetter = Arc<
	dyn for<'a> Fn(&'a FieldValue<'a>, &Plan) -> Result<Option<FieldValue<'a>>, GqlError>
		+ Send
		+ Sync,
>;

pub(crate) fn field_getter<F>(f: F) -> FieldGetter
where
	F: for<'a> Fn(&'a FieldValue<'a>, &Plan) -> Result<Option<FieldValue<'a>>, GqlError>
		+ Send
		+ Sync
		+ 'static,
{
	Arc::new(f)
}

/// The value a resolver method is invoked on.
#[derive(Clone, Copy)]
pub enum Receiver<'a> {
	/// The root resolver captured when the schema was built.
	Captured(&'a (dyn Any + Send + Sync)),
	/// The parent object being resolved.
	Parent(&'a FieldValue<'a>),
}

impl<'a> Receiver<'a> {
	pub fn downcast<T: Any>(self) -> Option<&'a T> {
		match self {
			Receiver::Captured(value) => value.downcast_ref::<T>(),
			Receiver::Parent(value) => value.downcast_ref::<T>(),
		}
	}
}

type Invoker = Arc<
	dyn for<'r> Fn(
			Receiver<'r>,
			&Context<'_>,
			&QueryArgs,
			&CallEnv,
		) -> Result<Option<FieldValue<'static>>, GqlError>
		+ Send
		+ Sync,
>;

fn invoker<F>(f: F) -> Invoker
where
	F: for<'r> Fn(
			Receiver<'r>,
			&Context<'_>,
			&QueryArgs,
			&CallEnv,
		) -> Result<Option<FieldValue<'static>>, GqlError>
		+ Send
		+ Sync
		+ 'static,
{
	Arc::new(f)
}

/// A resolver method of `T`.
///
/// Implemented for functions and closures taking the receiver and the
/// request context, optionally followed by an [`Arguments`] struct, and
/// returning a `Result` whose error renders as the field's error message.
pub trait Method<T, Marker>: Send + Sync + 'static {
	type Output: Reflect;
	type Arguments: Arguments;
	const TAKES_ARGUMENTS: bool;

	fn call(
		&self,
		receiver: &T,
		ctx: &Context<'_>,
		arguments: Self::Arguments,
	) -> Result<Self::Output, String>;
}

impl<T, F, R, E> Method<T, (R, E)> for F
where
	T: 'static,
	F: Fn(&T, &Context<'_>) -> Result<R, E> + Send + Sync + 'static,
	R: Reflect,
	E: Display + 'static,
{
	type Output = R;
	type Arguments = ();
	const TAKES_ARGUMENTS: bool = false;

	fn call(&self, receiver: &T, ctx: &Context<'_>, _: ()) -> Result<R, String> {
		self(receiver, ctx).map_err(|e| e.to_string())
	}
}

impl<T, F, A, R, E> Method<T, (A, R, E)> for F
where
	T: 'static,
	F: Fn(&T, &Context<'_>, A) -> Result<R, E> + Send + Sync + 'static,
	A: Arguments,
	R: Reflect,
	E: Display + 'static,
{
	type Output = R;
	type Arguments = A;
	const TAKES_ARGUMENTS: bool = true;

	fn call(&self, receiver: &T, ctx: &Context<'_>, arguments: A) -> Result<R, String> {
		self(receiver, ctx, arguments).map_err(|e| e.to_string())
	}
}

/// A registered resolver method, with its receiver and argument types erased.
pub struct MethodDef {
	pub(crate) name: String,
	pub(crate) output: TypeDescriptor,
	pub(crate) arguments: Option<fn(&Config) -> ArgumentsDescriptor>,
	invoker: Invoker,
}

impl MethodDef {
	pub(crate) fn new<T, M, Marker>(name: &str, method: M) -> Self
	where
		T: Send + Sync + 'static,
		M: Method<T, Marker>,
		Marker: 'static,
	{
		let owner = name.to_owned();
		let invoker = invoker(move |receiver, ctx, query, env| {
			let this = receiver.downcast::<T>().ok_or_else(|| {
				internal_error(format!(
					"failed to downcast the receiver of `{owner}` to `{}`",
					type_name::<T>()
				))
			})?;
			let arguments = match &env.arguments {
				Some(descriptor) => {
					let bound = descriptor.bind(ctx.data_opt::<RootData>(), query);
					if let Some(validator) = &env.validator {
						validator.validate(bound.as_ref()).map_err(|e| {
							debug!(method = %owner, "arguments were rejected: {e}");
							GqlError::ValidationError(e.to_string())
						})?;
					}
					bound.downcast::<M::Arguments>().map(|a| *a).unwrap_or_default()
				}
				None => M::Arguments::default(),
			};
			let output = method.call(this, ctx, arguments).map_err(GqlError::ResolverError)?;
			Ok(output.emit_owned(&env.plan))
		});
		let describe: fn(&Config) -> ArgumentsDescriptor = ArgumentsDescriptor::of::<M::Arguments>;
		Self {
			name: name.to_owned(),
			output: M::Output::descriptor(),
			arguments: M::TAKES_ARGUMENTS.then_some(describe),
			invoker,
		}
	}

	pub fn output(&self) -> &TypeDescriptor {
		&self.output
	}

	pub fn takes_arguments(&self) -> bool {
		self.arguments.is_some()
	}
}

impl Named for MethodDef {
	fn name(&self) -> &str {
		&self.name
	}
}

/// What a method field needs at request time, fixed when it is classified.
pub(crate) struct CallEnv {
	pub(crate) plan: Plan,
	pub(crate) arguments: Option<ArgumentsDescriptor>,
	pub(crate) validator: Option<Arc<dyn Validator>>,
}

/// A bound method field.
pub(crate) struct Call {
	invoker: Invoker,
	env: CallEnv,
	/// The root resolver, for fields of the query type.
	captured: Option<Arc<dyn Any + Send + Sync>>,
}

impl Call {
	pub(crate) fn new(
		method: &MethodDef,
		env: CallEnv,
		captured: Option<Arc<dyn Any + Send + Sync>>,
	) -> Self {
		Self {
			invoker: method.invoker.clone(),
			env,
			captured,
		}
	}
}

/// Builds a field which reads a struct field of its parent.
pub(crate) fn resolve_field(name: &str, ty: TypeRef, getter: FieldGetter, plan: Plan) -> Field {
	Field::new(name, ty, move |ctx| {
		let value = settle(ctx.ctx, getter(ctx.parent_value, &plan));
		FieldFuture::Value(value)
	})
}

/// Builds a field which invokes a resolver method.
pub(crate) fn resolve_method(name: &str, ty: TypeRef, call: Call) -> Field {
	Field::new(name, ty, move |ctx| {
		let receiver = match &call.captured {
			Some(root) => Receiver::Captured(root.as_ref()),
			None => Receiver::Parent(ctx.parent_value),
		};
		let value = settle(
			ctx.ctx,
			(call.invoker)(receiver, ctx.ctx, ctx.args.as_index_map(), &call.env),
		);
		FieldFuture::Value(value)
	})
}

/// Records a failed field as a request error at the field's path, leaving
/// the field itself null so that its siblings still resolve.
fn settle<'a>(
	ctx: &Context<'_>,
	value: Result<Option<FieldValue<'a>>, GqlError>,
) -> Option<FieldValue<'a>> {
	match value {
		Ok(value) => value,
		Err(e) => {
			let err = async_graphql::Error::from(e).into_server_error(ctx.item.pos);
			ctx.add_error(ctx.set_error_path(err));
			None
		}
	}
}
