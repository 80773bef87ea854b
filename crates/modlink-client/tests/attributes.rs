// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, missing_docs)]
//! Attribute protocol against the in-memory host.

use std::sync::Arc;

use modlink_client::{AttributeApi, Channel, Item, ItemApi, Proxy, RpcError};
use modlink_dry_tests::{FakeHost, DYNAMIC_ATTRIBUTE_BASE};
use modlink_proto::messages::{GetByNameRequest, SetByAttrIdRequest, SetByIxRequest, SetByNameRequest};
use modlink_proto::{
    AttrType, AttrValue, AttributeId, Bytes, Float2, Float3, Float4, Int2, Int3, Int4, Long2,
    Matrix, ObjectRef, ObjectType, Rpc, TimeSampling,
};

fn setup() -> (Arc<FakeHost>, Channel, ObjectRef) {
    let host = FakeHost::new();
    let channel = host.channel();
    let item = host.add_item(ObjectType::Item, "subject", host.root());
    (host, channel, item)
}

#[test]
fn every_scalar_type_keeps_its_tag() {
    let (host, channel, item_ref) = setup();
    let item = Item::attached(item_ref, &channel);

    item.set("b", true, false).unwrap();
    item.set("i", -7i32, false).unwrap();
    item.set("i2", Int2 { x: 1, y: 2 }, false).unwrap();
    item.set("i3", Int3 { x: 1, y: 2, z: 3 }, false).unwrap();
    item.set("i4", Int4 { x: 1, y: 2, z: 3, w: 4 }, false).unwrap();
    item.set("l", 1i64 << 40, false).unwrap();
    item.set("l2", Long2 { x: -1, y: 1 << 33 }, false).unwrap();
    item.set("f", 0.5f32, false).unwrap();
    item.set("f2", Float2 { x: 0.5, y: 1.5 }, false).unwrap();
    item.set("f3", Float3 { x: 0.5, y: 1.5, z: 2.5 }, false).unwrap();
    item.set("f4", Float4 { x: 0.5, y: 1.5, z: 2.5, w: 3.5 }, false).unwrap();
    item.set("m", Matrix::identity(), false).unwrap();
    item.set("s", String::from("hello"), false).unwrap();
    item.set("bytes", Bytes::from_static(b"\x00\x01\xff"), false).unwrap();

    assert!(item.get_bool("b").unwrap());
    assert_eq!(item.get_int("i").unwrap(), -7);
    assert_eq!(item.get::<Int2>("i2").unwrap(), Int2 { x: 1, y: 2 });
    assert_eq!(item.get::<Int3>("i3").unwrap(), Int3 { x: 1, y: 2, z: 3 });
    assert_eq!(item.get::<Int4>("i4").unwrap(), Int4 { x: 1, y: 2, z: 3, w: 4 });
    assert_eq!(item.get::<i64>("l").unwrap(), 1i64 << 40);
    assert_eq!(item.get::<Long2>("l2").unwrap(), Long2 { x: -1, y: 1 << 33 });
    assert_eq!(item.get_float("f").unwrap(), 0.5);
    assert_eq!(item.get::<Float2>("f2").unwrap(), Float2 { x: 0.5, y: 1.5 });
    assert_eq!(item.get::<Float3>("f3").unwrap(), Float3 { x: 0.5, y: 1.5, z: 2.5 });
    assert_eq!(
        item.get::<Float4>("f4").unwrap(),
        Float4 { x: 0.5, y: 1.5, z: 2.5, w: 3.5 }
    );
    assert_eq!(item.get_matrix("m").unwrap(), Matrix::identity());
    assert_eq!(item.get_string("s").unwrap(), "hello");
    assert_eq!(item.get::<Bytes>("bytes").unwrap().as_ref(), b"\x00\x01\xff");

    assert_eq!(item.attr_type("l2").unwrap(), AttrType::Long2);
    assert_eq!(item.attr_type("bytes").unwrap(), AttrType::ByteArray);
    assert_eq!(host.attribute_names(item_ref).len(), 14);
}

#[test]
fn every_array_type_keeps_its_tag() {
    let (_host, channel, item_ref) = setup();
    let item = Item::attached(item_ref, &channel);

    item.set("bools", vec![true, false], false).unwrap();
    item.set("ints", vec![1i32, 2, 3], false).unwrap();
    item.set("int2s", vec![Int2 { x: 1, y: 2 }], false).unwrap();
    item.set("int3s", vec![Int3 { x: 1, y: 2, z: 3 }], false).unwrap();
    item.set("int4s", vec![Int4 { x: 1, y: 2, z: 3, w: 4 }, Int4::default()], false)
        .unwrap();
    item.set("longs", vec![1i64, -1], false).unwrap();
    item.set("long2s", vec![Long2 { x: i64::MIN, y: 9 }], false).unwrap();
    item.set("floats", vec![0.25f32, 0.75], false).unwrap();
    item.set("float2s", vec![Float2 { x: 0.5, y: -0.5 }], false).unwrap();
    item.set("float3s", vec![Float3::default(), Float3 { x: 1.0, y: 2.0, z: 3.0 }], false)
        .unwrap();
    item.set("float4s", vec![Float4 { x: 1.0, y: 2.0, z: 3.0, w: 4.0 }], false).unwrap();
    item.set("matrices", vec![Matrix::identity()], false).unwrap();
    item.set("strings", vec!["a".to_string(), "b".to_string()], false).unwrap();

    assert_eq!(item.get::<Vec<bool>>("bools").unwrap(), vec![true, false]);
    assert_eq!(item.get::<Vec<i32>>("ints").unwrap(), vec![1, 2, 3]);
    assert_eq!(item.get::<Vec<Int2>>("int2s").unwrap(), vec![Int2 { x: 1, y: 2 }]);
    assert_eq!(item.get::<Vec<Int3>>("int3s").unwrap(), vec![Int3 { x: 1, y: 2, z: 3 }]);
    assert_eq!(
        item.get::<Vec<Int4>>("int4s").unwrap(),
        vec![Int4 { x: 1, y: 2, z: 3, w: 4 }, Int4::default()]
    );
    assert_eq!(item.get::<Vec<i64>>("longs").unwrap(), vec![1, -1]);
    assert_eq!(item.get::<Vec<Long2>>("long2s").unwrap(), vec![Long2 { x: i64::MIN, y: 9 }]);
    assert_eq!(item.get::<Vec<f32>>("floats").unwrap(), vec![0.25, 0.75]);
    assert_eq!(item.get::<Vec<Float2>>("float2s").unwrap(), vec![Float2 { x: 0.5, y: -0.5 }]);
    assert_eq!(item.get::<Vec<Float3>>("float3s").unwrap().len(), 2);
    assert_eq!(
        item.get::<Vec<Float4>>("float4s").unwrap(),
        vec![Float4 { x: 1.0, y: 2.0, z: 3.0, w: 4.0 }]
    );
    assert_eq!(item.get::<Vec<Matrix>>("matrices").unwrap(), vec![Matrix::identity()]);
    assert_eq!(
        item.get::<Vec<String>>("strings").unwrap(),
        vec!["a".to_string(), "b".to_string()]
    );
    assert_eq!(item.attr_type("floats").unwrap(), AttrType::FloatArray);
    assert_eq!(item.attr_type("int3s").unwrap(), AttrType::Int3Array);
    assert_eq!(item.attr_type("int4s").unwrap(), AttrType::Int4Array);
    assert_eq!(item.attr_type("long2s").unwrap(), AttrType::Long2Array);
    assert_eq!(item.attr_type("float2s").unwrap(), AttrType::Float2Array);
    assert_eq!(item.attr_type("float4s").unwrap(), AttrType::Float4Array);
}

#[test]
fn reading_with_the_wrong_type_is_invalid_argument() {
    let (host, channel, item_ref) = setup();
    host.define_attribute(item_ref, AttributeId::A_VALUE, "value", AttrValue::Float(1.0));
    let item = Item::attached(item_ref, &channel);

    let err = item.get_int(AttributeId::A_VALUE).unwrap_err();
    assert!(err.is_invalid_argument(), "{err}");
    let err = item.set(AttributeId::A_VALUE, 3i32, false).unwrap_err();
    assert!(err.is_invalid_argument(), "{err}");
    assert_eq!(
        host.attribute(item_ref, AttributeId::A_VALUE),
        Some(AttrValue::Float(1.0))
    );
}

#[test]
fn id_name_and_index_address_the_same_attribute() {
    let (host, channel, item_ref) = setup();
    host.define_attribute(item_ref, AttributeId::A_FILENAME, "filename", AttrValue::String(String::new()));
    host.define_attribute(item_ref, AttributeId::A_VALUE, "value", AttrValue::Int(0));
    let item = Item::attached(item_ref, &channel);

    item.set(AttributeId::A_VALUE, 11i32, false).unwrap();
    assert_eq!(item.get_int("value").unwrap(), 11);
    assert_eq!(item.get_int(1u32).unwrap(), 11);

    item.set("value", 12i32, false).unwrap();
    assert_eq!(item.get_int(AttributeId::A_VALUE).unwrap(), 12);

    item.set(1u32, 13i32, false).unwrap();
    assert_eq!(item.get_int(AttributeId::A_VALUE).unwrap(), 13);
    assert_eq!(item.get_int("value").unwrap(), 13);

    assert_eq!(item.attr_count().unwrap(), 2);
    assert_eq!(item.attr_id_at(0).unwrap(), AttributeId::A_FILENAME);
    assert_eq!(item.attr_name(AttributeId::A_VALUE).unwrap(), "value");

    assert_eq!(host.call_count(SetByAttrIdRequest::METHOD), 1);
    assert_eq!(host.call_count(SetByNameRequest::METHOD), 1);
    assert_eq!(host.call_count(SetByIxRequest::METHOD), 1);
    assert_eq!(host.call_count(GetByNameRequest::METHOD), 2);
}

#[test]
fn out_of_range_index_is_invalid_argument() {
    let (host, channel, item_ref) = setup();
    host.define_attribute(item_ref, AttributeId::A_VALUE, "value", AttrValue::Int(0));
    let item = Item::attached(item_ref, &channel);

    assert!(item.get_int(1u32).unwrap_err().is_invalid_argument());
    assert!(item.set(5u32, 1i32, false).unwrap_err().is_invalid_argument());
    assert!(!item.has_attr(1u32).unwrap());
    assert!(item.has_attr(0u32).unwrap());
}

#[test]
fn speed_attribute_set_by_name_is_removed_by_clear() {
    let (_host, channel, item_ref) = setup();
    let item = Item::attached(item_ref, &channel);

    item.set("speed", 3.5f32, true).unwrap();
    assert_eq!(item.get_float("speed").unwrap(), 3.5);
    assert!(item.has_attr("speed").unwrap());
    let ids: Vec<u32> = (0..item.attr_count().unwrap())
        .map(|ix| item.attr_id_at(ix).unwrap().0)
        .collect();
    assert_eq!(ids, vec![DYNAMIC_ATTRIBUTE_BASE]);

    item.clear_attr("speed", false).unwrap();
    assert!(!item.has_attr("speed").unwrap());
    let err = item.get_float("speed").unwrap_err();
    assert!(err.is_invalid_argument(), "{err}");
}

#[test]
fn clearing_a_defined_attribute_restores_its_default() {
    let (host, channel, item_ref) = setup();
    host.define_attribute(item_ref, AttributeId::A_POSITION, "position", AttrValue::Float3(Float3::default()));
    let item = Item::attached(item_ref, &channel);

    item.set(AttributeId::A_POSITION, Float3 { x: 1.0, y: 2.0, z: 3.0 }, false).unwrap();
    item.set("extra", 1i32, false).unwrap();
    item.clear_attr(AttributeId::A_POSITION, false).unwrap();
    assert_eq!(item.get::<Float3>("position").unwrap(), Float3::default());
    assert!(item.has_attr("extra").unwrap());

    item.set(AttributeId::A_POSITION, Float3 { x: 9.0, y: 9.0, z: 9.0 }, false).unwrap();
    item.clear_all_attr(false).unwrap();
    assert_eq!(host.attribute_names(item_ref), vec!["position".to_string()]);
    assert_eq!(
        host.attribute(item_ref, AttributeId::A_POSITION),
        Some(AttrValue::Float3(Float3::default()))
    );
}

#[test]
fn animation_with_several_samples_round_trips() {
    let (host, channel, item_ref) = setup();
    host.define_attribute(item_ref, AttributeId::A_POSITION, "position", AttrValue::Float3(Float3::default()));
    let item = Item::attached(item_ref, &channel);

    let times = TimeSampling::new(vec![0.0, 0.5, 1.0], 1.5);
    let values = vec![
        Float3 { x: 0.0, y: 0.0, z: 0.0 },
        Float3 { x: 1.0, y: 0.0, z: 0.0 },
        Float3 { x: 2.0, y: 0.0, z: 0.0 },
    ];
    item.set_anim(AttributeId::A_POSITION, times.clone(), values.clone(), false)
        .unwrap();
    assert!(item.is_animated("position").unwrap());

    let (anim, count) = item
        .get_anim_with_count::<Float3>(AttributeId::A_POSITION)
        .unwrap();
    assert_eq!(count, 3);
    assert_eq!(anim.times, times);
    assert_eq!(anim.values, values);

    item.clear_anim(0u32, false).unwrap();
    assert!(!item.is_animated(AttributeId::A_POSITION).unwrap());
}

#[test]
fn single_sample_animation_may_hold_several_values() {
    let (host, channel, item_ref) = setup();
    host.define_attribute(item_ref, AttributeId::A_VALUE, "weights", AttrValue::Float(0.0));
    let item = Item::attached(item_ref, &channel);

    let times = TimeSampling::new(vec![2.0], 3.0);
    item.set_anim("weights", times.clone(), vec![0.1f32, 0.2, 0.3], false)
        .unwrap();
    let anim = item.get_anim::<f32>("weights").unwrap();
    assert_eq!(anim.times.sample_count(), 1);
    assert_eq!(anim.values, vec![0.1, 0.2, 0.3]);
}

#[test]
fn empty_animation_clears_and_reads_back_empty() {
    let (host, channel, item_ref) = setup();
    host.define_attribute(item_ref, AttributeId::A_VALUE, "value", AttrValue::Int(0));
    let item = Item::attached(item_ref, &channel);

    item.set_anim("value", TimeSampling::regular(1.0, 2), vec![1i32, 2], false)
        .unwrap();
    item.set_anim("value", TimeSampling::default(), Vec::<i32>::new(), false)
        .unwrap();
    assert!(!item.is_animated("value").unwrap());

    let (anim, count) = item.get_anim_with_count::<i32>("value").unwrap();
    assert!(anim.times.is_empty());
    assert!(anim.values.is_empty());
    assert_eq!(count, 0);
}

#[test]
fn mismatched_animation_lengths_are_rejected_before_sending() {
    let (host, channel, item_ref) = setup();
    host.define_attribute(item_ref, AttributeId::A_VALUE, "value", AttrValue::Int(0));
    let item = Item::attached(item_ref, &channel);
    let before = host.calls().len();

    let err = item
        .set_anim("value", TimeSampling::regular(1.0, 2), vec![1i32, 2, 3], false)
        .unwrap_err();
    assert!(matches!(err, RpcError::InvalidArgument(_)), "{err}");
    let err = item
        .set_anim("value", TimeSampling::default(), vec![1i32], false)
        .unwrap_err();
    assert!(err.is_invalid_argument());
    assert_eq!(host.calls().len(), before);
}

#[test]
fn copy_takes_value_and_animation_from_the_source() {
    let (host, channel, source_ref) = setup();
    let dest_ref = host.add_item(ObjectType::Item, "dest", host.root());
    host.define_attribute(source_ref, AttributeId::A_COLOR, "color", AttrValue::Float4(Float4::default()));
    host.define_attribute(dest_ref, AttributeId::A_COLOR, "tint", AttrValue::Float4(Float4::default()));
    host.define_attribute(dest_ref, AttributeId::A_VALUE, "value", AttrValue::Int(0));
    let source = Item::attached(source_ref, &channel);
    let dest = Item::attached(dest_ref, &channel);

    let red = Float4 { x: 1.0, y: 0.0, z: 0.0, w: 1.0 };
    source.set("color", red, false).unwrap();
    dest.copy_attr_from(AttributeId::A_COLOR, &source, "color", false)
        .unwrap();
    assert_eq!(dest.get::<Float4>("tint").unwrap(), red);

    let err = dest
        .copy_attr_from(AttributeId::A_VALUE, &source, AttributeId::A_COLOR, false)
        .unwrap_err();
    assert!(err.is_invalid_argument());
    let err = dest
        .copy_attr_from(AttributeId::A_VALUE, &source, 4u32, false)
        .unwrap_err();
    assert!(err.is_invalid_argument());
}

#[test]
fn writes_forward_their_evaluate_flag() {
    let (host, channel, item_ref) = setup();
    let source_ref = host.add_item(ObjectType::Item, "source", host.root());
    host.define_attribute(item_ref, AttributeId::A_VALUE, "value", AttrValue::Float(0.0));
    host.define_attribute(source_ref, AttributeId::A_VALUE, "value", AttrValue::Float(9.0));
    let item = Item::attached(item_ref, &channel);
    let source = Item::attached(source_ref, &channel);

    item.set(AttributeId::A_VALUE, 1.0f32, false).unwrap();
    assert_eq!(host.evaluations(item_ref), 0);
    item.set("value", 2.0f32, true).unwrap();
    item.set(0u32, 3.0f32, true).unwrap();
    assert_eq!(host.evaluations(item_ref), 2);

    item.set_anim("value", TimeSampling::regular(1.0, 2), vec![1.0f32, 2.0], true)
        .unwrap();
    item.clear_anim("value", false).unwrap();
    assert_eq!(host.evaluations(item_ref), 3);
    item.clear_anim(AttributeId::A_VALUE, true).unwrap();
    assert_eq!(host.evaluations(item_ref), 4);

    item.clear_attr(AttributeId::A_VALUE, false).unwrap();
    assert_eq!(host.evaluations(item_ref), 4);
    item.clear_attr("value", true).unwrap();
    assert_eq!(host.evaluations(item_ref), 5);

    item.copy_attr_from(AttributeId::A_VALUE, &source, "value", true)
        .unwrap();
    item.copy_attr_from(AttributeId::A_VALUE, &source, AttributeId::A_VALUE, false)
        .unwrap();
    assert_eq!(host.evaluations(item_ref), 6);
    assert_eq!(item.get_float("value").unwrap(), 9.0);

    item.clear_all_attr(true).unwrap();
    assert_eq!(host.evaluations(item_ref), 7);

    // A rejected write evaluates nothing.
    assert!(item.set(AttributeId::A_VALUE, 1i32, true).is_err());
    assert_eq!(host.evaluations(item_ref), 7);
    assert_eq!(host.evaluations(source_ref), 0);
}
