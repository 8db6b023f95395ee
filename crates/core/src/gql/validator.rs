use std::any::Any;
use std::marker::PhantomData;

use super::args::Arguments;

/// Checks a populated argument struct before its resolver method runs.
///
/// A rejection becomes the field's error, carrying the validator's message,
/// and the method is not invoked.
pub trait Validator: Send + Sync + 'static {
	fn validate(&self, arguments: &(dyn Any + Send + Sync)) -> anyhow::Result<()>;
}

impl<F> Validator for F
where
	F: Fn(&(dyn Any + Send + Sync)) -> anyhow::Result<()> + Send + Sync + 'static,
{
	fn validate(&self, arguments: &(dyn Any + Send + Sync)) -> anyhow::Result<()> {
		self(arguments)
	}
}

/// A validator which only inspects argument structs of type `A`, letting
/// every other argument struct through.
pub struct Typed<A, F> {
	check: F,
	_marker: PhantomData<fn(&A)>,
}

pub fn typed<A, F>(check: F) -> Typed<A, F>
where
	A: Arguments,
	F: Fn(&A) -> anyhow::Result<()> + Send + Sync + 'static,
{
	Typed {
		check,
		_marker: PhantomData,
	}
}

impl<A, F> Validator for Typed<A, F>
where
	A: Arguments,
	F: Fn(&A) -> anyhow::Result<()> + Send + Sync + 'static,
{
	fn validate(&self, arguments: &(dyn Any + Send + Sync)) -> anyhow::Result<()> {
		match arguments.downcast_ref::<A>() {
			Some(arguments) => (self.check)(arguments),
			None => Ok(()),
		}
	}
}
