use std::ops::Deref;

use async_graphql::Value as GqlValue;
use serde_json::Number;

use super::GqlError;
use super::error::resolver_error;

pub trait TryIntoExt<T> {
	type Error;

	fn try_intox(self) -> Result<T, Self::Error>;
}

pub trait TryFromExt<T>: Sized {
	type Error;

	fn try_fromx(value: T) -> Result<Self, Self::Error>;
}

impl<S, T> TryIntoExt<T> for S
where
	T: TryFromExt<S>,
{
	type Error = <T as TryFromExt<S>>::Error;

	fn try_intox(self) -> Result<T, <T as TryFromExt<S>>::Error> {
		T::try_fromx(self)
	}
}

impl TryFromExt<f64> for GqlValue {
	type Error = GqlError;

	fn try_fromx(value: f64) -> Result<Self, GqlError> {
		Ok(Self::Number(Number::from_f64(value).ok_or_else(|| {
			resolver_error(format!("non-finite float (not supported in json): {}", value))
		})?))
	}
}

impl TryFromExt<f32> for GqlValue {
	type Error = GqlError;

	fn try_fromx(value: f32) -> Result<Self, GqlError> {
		f64::from(value).try_intox()
	}
}

pub trait Named {
	fn name(&self) -> &str;
}

pub trait NamedContainer {
	fn contains_name(&self, name: &str) -> bool;
}

impl<I, N> NamedContainer for I
where
	I: Deref<Target = [N]>,
	N: Named,
{
	fn contains_name(&self, name: &str) -> bool {
		self.iter().any(|n| n.name() == name)
	}
}
