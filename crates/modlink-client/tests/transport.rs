// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, missing_docs)]
//! Proxies over a real socket to a host server.

use std::thread;

use modlink_client::{
    AttributeApi, Channel, ControlService, Item, ItemApi, NodeGraph, NodeGraphApi, Proxy,
    SocketTransport,
};
use modlink_dry_tests::{FakeHost, HostServer};
use modlink_proto::messages::{LogLevel, NameRequest};
use modlink_proto::{AttrValue, AttributeId, ObjectType, Rpc, StatusCode, TimeSampling};

#[test]
fn attribute_calls_survive_the_socket() {
    let host = FakeHost::new();
    let item_ref = host.add_item(ObjectType::Item, "camera", host.root());
    host.define_attribute(item_ref, AttributeId::A_RESOLUTION, "resolution", AttrValue::Int2(Default::default()));
    let server = HostServer::spawn(host.clone()).unwrap();
    let channel = Channel::new(SocketTransport::new(server.endpoint()));

    let root = NodeGraph::root_node_graph(&channel).unwrap();
    assert_eq!(root.name().unwrap(), "root");
    let items = root.find_items_by_name("camera", false).unwrap();
    assert_eq!(items.len(), 1);
    let camera = &items[0];

    camera
        .set(AttributeId::A_RESOLUTION, modlink_proto::Int2 { x: 1920, y: 1080 }, true)
        .unwrap();
    assert_eq!(
        host.attribute(item_ref, AttributeId::A_RESOLUTION),
        Some(AttrValue::Int2(modlink_proto::Int2 { x: 1920, y: 1080 }))
    );

    camera.set("exposure", 0.25f32, false).unwrap();
    camera
        .set_anim("exposure", TimeSampling::regular(0.5, 2), vec![0.25f32, 1.0], false)
        .unwrap();
    let anim = camera.get_anim::<f32>("exposure").unwrap();
    assert_eq!(anim.values, vec![0.25, 1.0]);

    let err = camera.get_float(7u32).unwrap_err();
    assert!(err.is_invalid_argument(), "{err}");
    assert!(server.path().exists());
}

#[test]
fn concurrent_callers_share_one_channel() {
    let host = FakeHost::new();
    let server = HostServer::spawn(host.clone()).unwrap();
    let channel = Channel::new(SocketTransport::new(server.endpoint()));
    let root = NodeGraph::root_node_graph(&channel).unwrap();
    let item_refs: Vec<_> = (0..4)
        .map(|i| host.add_item(ObjectType::Item, &format!("item{i}"), root.object_ref()))
        .collect();

    let workers: Vec<_> = item_refs
        .iter()
        .map(|item_ref| {
            let item = Item::attached(*item_ref, &channel);
            thread::spawn(move || {
                for n in 0..20 {
                    item.set("n", n, false).unwrap();
                    assert_eq!(item.get_int("n").unwrap(), n);
                }
                item.name().unwrap()
            })
        })
        .collect();
    let mut names: Vec<String> = workers.into_iter().map(|w| w.join().unwrap()).collect();
    names.sort();
    assert_eq!(names, vec!["item0", "item1", "item2", "item3"]);
    assert_eq!(host.call_count(NameRequest::METHOD), 4);
}

#[test]
fn host_statuses_cross_the_socket_intact() {
    let host = FakeHost::new();
    let server = HostServer::spawn(host.clone()).unwrap();
    let channel = Channel::new(SocketTransport::new(server.endpoint()));
    let control = ControlService::new(&channel);

    control.log(LogLevel::Error, "disk full").unwrap();
    assert_eq!(host.log_lines(), vec![(LogLevel::Error, "disk full".to_string())]);

    host.fail_method(
        NameRequest::METHOD,
        modlink_proto::Status::new(StatusCode::Internal, "renderer fault"),
    );
    let err = Item::attached(host.root(), &channel).name().unwrap_err();
    assert_eq!(err.status_code(), Some(StatusCode::Internal));
    assert!(err.to_string().contains("renderer fault"));
}
