// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Attribute access over the wire.
//!
//! Every operation takes an [`AttrAddress`] and dispatches to the RPC for
//! that addressing mode. Values cross the wire in the tagged container; the
//! caller's Rust type picks the expected tag ([`AttrKind::TYPE`]) and a
//! mismatch is reported by the host, not detected here.

use modlink_proto::messages::{
    AttrTypeByAttrIdRequest, AttrTypeByIxRequest, AttrTypeByNameRequest, ClearAllAttrRequest,
    ClearAnimByAttrIdRequest, ClearAnimByIxRequest, ClearAnimByNameRequest,
    ClearAttrByAttrIdRequest, ClearAttrByIxRequest, ClearAttrByNameRequest, CopyAttrFromIxRequest,
    CopyAttrFromNameRequest, CopyAttrFromRequest, GetAnimByAttrIdRequest, GetAnimByIxRequest,
    GetAnimByNameRequest, GetAnimResponse, GetByAttrIdRequest, GetByIxRequest, GetByNameRequest,
    HasAttrByAttrIdRequest, HasAttrByIxRequest, HasAttrByNameRequest, IsAnimatedByAttrIdRequest,
    IsAnimatedByIxRequest, IsAnimatedByNameRequest, SetAnimByAttrIdRequest, SetAnimByIxRequest,
    SetAnimByNameRequest, SetByAttrIdRequest, SetByIxRequest, SetByNameRequest,
};
use modlink_proto::{AttrKind, AttrScalar, AttrType, AttrValueMsg, AttributeId, Matrix, TimeSampling};

use crate::error::{RpcError, RpcResult};
use crate::item::ItemApi;

/// How an attribute is named in a request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AttrAddress {
    /// Fixed attribute id.
    Id(AttributeId),
    /// Attribute name.
    Name(String),
    /// Position in the item's attribute list.
    Index(u32),
}

impl From<AttributeId> for AttrAddress {
    fn from(id: AttributeId) -> Self {
        Self::Id(id)
    }
}

impl From<&str> for AttrAddress {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

impl From<String> for AttrAddress {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

impl From<u32> for AttrAddress {
    fn from(index: u32) -> Self {
        Self::Index(index)
    }
}

/// Animated attribute value.
#[derive(Debug, Clone, PartialEq)]
pub struct Animation<T> {
    /// Sample times.
    pub times: TimeSampling,
    /// Values for every sample, `times.sample_count()` groups of equal size.
    pub values: Vec<T>,
}

fn decode<T: AttrKind>(msg: AttrValueMsg, expected: AttrType) -> RpcResult<T> {
    msg.take(expected)
        .and_then(T::from_value)
        .ok_or(RpcError::UnexpectedResponse { expected })
}

fn decode_anim<T: AttrScalar>(resp: GetAnimResponse) -> RpcResult<(Animation<T>, Option<u32>)> {
    let values = if resp.times.is_empty() && resp.values.populated().is_none() {
        Vec::new()
    } else {
        decode::<Vec<T>>(resp.values, T::ARRAY_TYPE)?
    };
    Ok((
        Animation {
            times: resp.times,
            values,
        },
        resp.sample_count,
    ))
}

fn fetch_anim<P: ItemApi, T: AttrScalar>(
    proxy: &P,
    addr: AttrAddress,
) -> RpcResult<(Animation<T>, Option<u32>)> {
    let item_ref = proxy.object_ref();
    let expected_type = T::TYPE;
    let resp = match addr {
        AttrAddress::Id(attribute_id) => proxy.call(&GetAnimByAttrIdRequest {
            item_ref,
            attribute_id,
            expected_type,
        })?,
        AttrAddress::Name(name) => proxy.call(&GetAnimByNameRequest {
            item_ref,
            name,
            expected_type,
        })?,
        AttrAddress::Index(index) => proxy.call(&GetAnimByIxRequest {
            item_ref,
            index,
            expected_type,
        })?,
    };
    decode_anim(resp)
}

/// Attribute protocol, available on every item-family proxy.
pub trait AttributeApi: ItemApi {
    /// Read an attribute as `T`.
    fn get<T: AttrKind>(&self, addr: impl Into<AttrAddress>) -> RpcResult<T> {
        let item_ref = self.object_ref();
        let expected_type = T::TYPE;
        let resp = match addr.into() {
            AttrAddress::Id(attribute_id) => self.call(&GetByAttrIdRequest {
                item_ref,
                attribute_id,
                expected_type,
            })?,
            AttrAddress::Name(name) => self.call(&GetByNameRequest {
                item_ref,
                name,
                expected_type,
            })?,
            AttrAddress::Index(index) => self.call(&GetByIxRequest {
                item_ref,
                index,
                expected_type,
            })?,
        };
        decode(resp.value, expected_type)
    }

    /// Write an attribute.
    fn set<T: AttrKind>(&self, addr: impl Into<AttrAddress>, value: T, evaluate: bool) -> RpcResult<()> {
        let item_ref = self.object_ref();
        let value = AttrValueMsg::from(value.into_value());
        match addr.into() {
            AttrAddress::Id(attribute_id) => self.call(&SetByAttrIdRequest {
                item_ref,
                attribute_id,
                value,
                evaluate,
            })?,
            AttrAddress::Name(name) => self.call(&SetByNameRequest {
                item_ref,
                name,
                value,
                evaluate,
            })?,
            AttrAddress::Index(index) => self.call(&SetByIxRequest {
                item_ref,
                index,
                value,
                evaluate,
            })?,
        };
        Ok(())
    }

    /// Read a `bool` attribute.
    fn get_bool(&self, addr: impl Into<AttrAddress>) -> RpcResult<bool> {
        self.get(addr)
    }

    /// Read an `i32` attribute.
    fn get_int(&self, addr: impl Into<AttrAddress>) -> RpcResult<i32> {
        self.get(addr)
    }

    /// Read an `f32` attribute.
    fn get_float(&self, addr: impl Into<AttrAddress>) -> RpcResult<f32> {
        self.get(addr)
    }

    /// Read a string attribute.
    fn get_string(&self, addr: impl Into<AttrAddress>) -> RpcResult<String> {
        self.get(addr)
    }

    /// Read a matrix attribute.
    fn get_matrix(&self, addr: impl Into<AttrAddress>) -> RpcResult<Matrix> {
        self.get(addr)
    }

    /// Read an attribute's animation. The host's explicit sample count is
    /// not requested.
    fn get_anim<T: AttrScalar>(&self, addr: impl Into<AttrAddress>) -> RpcResult<Animation<T>> {
        Ok(fetch_anim::<Self, T>(self, addr.into())?.0)
    }

    /// Read an attribute's animation together with the host's explicit
    /// sample count (0 when the host leaves it out).
    fn get_anim_with_count<T: AttrScalar>(
        &self,
        addr: impl Into<AttrAddress>,
    ) -> RpcResult<(Animation<T>, u32)> {
        let (anim, count) = fetch_anim::<Self, T>(self, addr.into())?;
        Ok((anim, count.unwrap_or_default()))
    }

    /// Replace an attribute's animation.
    ///
    /// Rejected locally with [`RpcError::InvalidArgument`] when the value
    /// count is not a whole multiple of the sample count, or when values are
    /// given without samples. An empty sampling with no values clears the
    /// animation.
    fn set_anim<T: AttrScalar>(
        &self,
        addr: impl Into<AttrAddress>,
        times: TimeSampling,
        values: Vec<T>,
        evaluate: bool,
    ) -> RpcResult<()> {
        if times.values_per_sample(values.len()).is_none() {
            return Err(RpcError::InvalidArgument(format!(
                "{} values do not fit {} samples",
                values.len(),
                times.sample_count()
            )));
        }
        let item_ref = self.object_ref();
        let values = AttrValueMsg::from(T::into_array(values));
        match addr.into() {
            AttrAddress::Id(attribute_id) => self.call(&SetAnimByAttrIdRequest {
                item_ref,
                attribute_id,
                times,
                values,
                evaluate,
            })?,
            AttrAddress::Name(name) => self.call(&SetAnimByNameRequest {
                item_ref,
                name,
                times,
                values,
                evaluate,
            })?,
            AttrAddress::Index(index) => self.call(&SetAnimByIxRequest {
                item_ref,
                index,
                times,
                values,
                evaluate,
            })?,
        };
        Ok(())
    }

    /// True when the attribute carries an animation.
    fn is_animated(&self, addr: impl Into<AttrAddress>) -> RpcResult<bool> {
        let item_ref = self.object_ref();
        let reply = match addr.into() {
            AttrAddress::Id(attribute_id) => self.call(&IsAnimatedByAttrIdRequest {
                item_ref,
                attribute_id,
            })?,
            AttrAddress::Name(name) => self.call(&IsAnimatedByNameRequest { item_ref, name })?,
            AttrAddress::Index(index) => self.call(&IsAnimatedByIxRequest { item_ref, index })?,
        };
        Ok(reply.result)
    }

    /// Drop an attribute's animation, keeping its current value.
    fn clear_anim(&self, addr: impl Into<AttrAddress>, evaluate: bool) -> RpcResult<()> {
        let item_ref = self.object_ref();
        match addr.into() {
            AttrAddress::Id(attribute_id) => self.call(&ClearAnimByAttrIdRequest {
                item_ref,
                attribute_id,
                evaluate,
            })?,
            AttrAddress::Name(name) => self.call(&ClearAnimByNameRequest {
                item_ref,
                name,
                evaluate,
            })?,
            AttrAddress::Index(index) => self.call(&ClearAnimByIxRequest {
                item_ref,
                index,
                evaluate,
            })?,
        };
        Ok(())
    }

    /// Reset an attribute to the host's default for it.
    fn clear_attr(&self, addr: impl Into<AttrAddress>, evaluate: bool) -> RpcResult<()> {
        let item_ref = self.object_ref();
        match addr.into() {
            AttrAddress::Id(attribute_id) => self.call(&ClearAttrByAttrIdRequest {
                item_ref,
                attribute_id,
                evaluate,
            })?,
            AttrAddress::Name(name) => self.call(&ClearAttrByNameRequest {
                item_ref,
                name,
                evaluate,
            })?,
            AttrAddress::Index(index) => self.call(&ClearAttrByIxRequest {
                item_ref,
                index,
                evaluate,
            })?,
        };
        Ok(())
    }

    /// Reset every attribute of the item.
    fn clear_all_attr(&self, evaluate: bool) -> RpcResult<()> {
        self.call(&ClearAllAttrRequest {
            item_ref: self.object_ref(),
            evaluate,
        })?;
        Ok(())
    }

    /// Copy the attribute `source_attr` of `source` into `dest_id` on this
    /// item.
    fn copy_attr_from<S: ItemApi>(
        &self,
        dest_id: AttributeId,
        source: &S,
        source_attr: impl Into<AttrAddress>,
        evaluate: bool,
    ) -> RpcResult<()> {
        let item_ref = self.object_ref();
        let source = source.object_ref();
        match source_attr.into() {
            AttrAddress::Id(source_id) => self.call(&CopyAttrFromRequest {
                item_ref,
                dest_id,
                source,
                source_id,
                evaluate,
            })?,
            AttrAddress::Name(source_name) => self.call(&CopyAttrFromNameRequest {
                item_ref,
                dest_id,
                source,
                source_name,
                evaluate,
            })?,
            AttrAddress::Index(source_index) => self.call(&CopyAttrFromIxRequest {
                item_ref,
                dest_id,
                source,
                source_index,
                evaluate,
            })?,
        };
        Ok(())
    }

    /// True when the item has the attribute.
    fn has_attr(&self, addr: impl Into<AttrAddress>) -> RpcResult<bool> {
        let item_ref = self.object_ref();
        let reply = match addr.into() {
            AttrAddress::Id(attribute_id) => self.call(&HasAttrByAttrIdRequest {
                item_ref,
                attribute_id,
            })?,
            AttrAddress::Name(name) => self.call(&HasAttrByNameRequest { item_ref, name })?,
            AttrAddress::Index(index) => self.call(&HasAttrByIxRequest { item_ref, index })?,
        };
        Ok(reply.result)
    }

    /// Declared type of the attribute.
    fn attr_type(&self, addr: impl Into<AttrAddress>) -> RpcResult<AttrType> {
        let item_ref = self.object_ref();
        let reply = match addr.into() {
            AttrAddress::Id(attribute_id) => self.call(&AttrTypeByAttrIdRequest {
                item_ref,
                attribute_id,
            })?,
            AttrAddress::Name(name) => self.call(&AttrTypeByNameRequest { item_ref, name })?,
            AttrAddress::Index(index) => self.call(&AttrTypeByIxRequest { item_ref, index })?,
        };
        Ok(reply.result)
    }
}

impl<P: ItemApi> AttributeApi for P {}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use modlink_proto::{AttrValue, Float3};

    #[test]
    fn addresses_convert_from_natural_types() {
        assert_eq!(
            AttrAddress::from(AttributeId::A_VALUE),
            AttrAddress::Id(AttributeId(1))
        );
        assert_eq!(AttrAddress::from("speed"), AttrAddress::Name("speed".into()));
        assert_eq!(AttrAddress::from(3u32), AttrAddress::Index(3));
    }

    #[test]
    fn decode_reports_empty_arm() {
        let msg = AttrValueMsg::from(AttrValue::Int(4));
        let err = decode::<f32>(msg, AttrType::Float).unwrap_err();
        assert!(matches!(
            err,
            RpcError::UnexpectedResponse {
                expected: AttrType::Float
            }
        ));
    }

    #[test]
    fn empty_animation_decodes_without_values() {
        let (anim, count) = decode_anim::<Float3>(GetAnimResponse::default()).unwrap();
        assert!(anim.times.is_empty());
        assert!(anim.values.is_empty());
        assert_eq!(count, None);
    }
}
