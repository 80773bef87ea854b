// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, missing_docs)]
//! Proxy lifecycle, typed proxies and error classification.

use modlink_client::{
    AttributeApi, Channel, ControlService, Item, ItemApi, ModuleNodeGraph, ModuleNodeGraphApi,
    Node, NodeApi, NodeGraph, NodeGraphApi, Proxy, RpcError,
};
use modlink_dry_tests::{FakeHost, UnreachableTransport, DEFAULT_PINS};
use modlink_proto::messages::{
    ExpandOutOfPinRequest, GraphOwnerRequest, LinkerInfo, NameRequest, ToGraphRequest,
};
use modlink_proto::{ObjectRef, ObjectType, Rpc, Status, StatusCode};

#[test]
fn attach_and_read_back_handles() {
    let host = FakeHost::new();
    let channel = host.channel();
    let mut item = Item::null().with_channel(&channel);
    assert!(item.is_null());

    for handle in [1, 42, -3, i64::MAX] {
        item.attach_object_handle(handle);
        assert_eq!(item.object_handle(), handle);
        assert!(!item.is_null());
    }
    item.set_null();
    assert!(item.is_null());
    assert_eq!(item.object_handle(), 0);
    assert!(host.calls().is_empty());
}

#[test]
fn reattached_handle_reaches_the_same_object() {
    let host = FakeHost::new();
    let channel = host.channel();
    let root = NodeGraph::root_node_graph(&channel).unwrap();
    let original = Node::create(&root, 12, true).unwrap();
    original.set("speed", 2.5f32, false).unwrap();

    let mut copy = Node::null().with_channel(&channel);
    copy.attach_object_handle(original.object_handle());
    assert_eq!(copy.name().unwrap(), original.name().unwrap());
    assert_eq!(copy.node_type().unwrap(), original.node_type().unwrap());
    assert_eq!(copy.get_float("speed").unwrap(), 2.5);
    assert_eq!(copy.pin_count().unwrap(), original.pin_count().unwrap());
}

#[test]
fn null_proxy_calls_are_rejected_by_the_host() {
    let host = FakeHost::new();
    let item = Item::null().with_channel(&host.channel());
    let err = item.name().unwrap_err();
    assert!(err.is_invalid_argument(), "{err}");
    assert_eq!(host.call_count(NameRequest::METHOD), 1);
}

#[test]
fn destroy_invalidates_every_copy_but_keeps_the_handle() {
    let host = FakeHost::new();
    let channel = host.channel();
    let item_ref = host.add_item(ObjectType::Item, "doomed", host.root());
    let item = Item::attached(item_ref, &channel);
    let copy = item.clone();

    item.destroy().unwrap();
    assert!(!host.is_live(item_ref.handle));
    assert!(!item.is_null());
    assert_eq!(copy.object_handle(), item_ref.handle);
    assert!(copy.name().unwrap_err().is_invalid_argument());
    assert!(item.destroy().unwrap_err().is_invalid_argument());
}

#[test]
fn proxies_compare_by_object() {
    let host = FakeHost::new();
    let channel = host.channel();
    let item_ref = host.add_item(ObjectType::Item, "same", host.root());
    let a = Item::attached(item_ref, &channel);
    let b = Item::attached(item_ref, &host.channel());
    assert_eq!(a, b);
    assert_ne!(a, Item::null());
}

#[test]
fn item_properties_round_trip() {
    let host = FakeHost::new();
    let channel = host.channel();
    let item_ref = host.add_item(ObjectType::Item, "before", host.root());
    let item = Item::attached(item_ref, &channel);

    assert_eq!(item.name().unwrap(), "before");
    item.set_name("after").unwrap();
    assert_eq!(host.name_of(item_ref.handle).as_deref(), Some("after"));
    assert!(!item.is_graph().unwrap());
    assert!(!item.is_node().unwrap());
    assert_eq!(item.unique_id().unwrap(), u32::try_from(item_ref.handle).unwrap());
    item.evaluate().unwrap();
    item.evaluate().unwrap();
    assert_eq!(host.evaluations(item_ref), 2);
}

#[test]
fn conversions_return_null_instead_of_failing() {
    let host = FakeHost::new();
    let channel = host.channel();
    let root = NodeGraph::root_node_graph(&channel).unwrap();
    let item_ref = host.add_item(ObjectType::Item, "plain", host.root());
    let item = Item::attached(item_ref, &channel);

    assert!(item.to_graph().is_null());
    assert!(item.to_node().is_null());
    assert_eq!(item.graph_owner(), root);
    assert!(root.graph_owner().is_null());
    assert!(!Item::from(root.clone()).to_graph().is_null());

    host.fail_method(GraphOwnerRequest::METHOD, Status::unavailable("host busy"));
    assert!(item.graph_owner().is_null());
    host.fail_method(ToGraphRequest::METHOD, Status::internal("boom"));
    assert!(Item::from(root).to_graph().is_null());
}

#[test]
fn nodes_connect_and_report_destinations() {
    let host = FakeHost::new();
    let channel = host.channel();
    let root = NodeGraph::root_node_graph(&channel).unwrap();

    let source = Node::create(&root, 7, false).unwrap();
    let target = Node::create(&root, 9, true).unwrap();
    assert_eq!(source.name().unwrap(), "node7");
    assert_eq!(target.node_type().unwrap(), 9);
    assert_eq!(source.pin_count().unwrap(), 0);
    assert_eq!(target.pin_count().unwrap() as usize, DEFAULT_PINS.len());
    assert_eq!(target.pin_name_at(1).unwrap(), DEFAULT_PINS[1]);
    assert!(target.is_node().unwrap());

    target.connect_to_ix(0, Some(&source), false).unwrap();
    assert_eq!(target.connected_node_ix(0, false).unwrap(), source);
    assert!(target.connected_node_ix(1, false).unwrap().is_null());
    assert_eq!(source.destinations().unwrap(), vec![target.clone()]);
    assert_eq!(source.destination_count().unwrap(), 1);
    assert_eq!(source.pin_owner(), target);

    target.connect_to_ix(0, None, false).unwrap();
    assert_eq!(source.destination_count().unwrap(), 0);

    let err = target.connect_to_ix(5, Some(&source), false).unwrap_err();
    assert!(err.is_invalid_argument(), "{err}");
    let err = target.pin_name_at(2).unwrap_err();
    assert!(err.is_invalid_argument(), "{err}");
}

#[test]
fn expand_out_of_pin_moves_the_input_next_to_its_node() {
    let host = FakeHost::new();
    let channel = host.channel();
    let root = NodeGraph::root_node_graph(&channel).unwrap();
    let inner = NodeGraph::create(&root, 1).unwrap();
    let owner = Node::create(&inner, 1, true).unwrap();
    let input = Node::create(&root, 2, false).unwrap();
    owner.connect_to_ix(0, Some(&input), false).unwrap();

    let expanded = owner.expand_out_of_pin(0);
    assert_eq!(expanded, input);
    assert_eq!(input.graph_owner(), inner);
    assert!(owner.expand_out_of_pin(1).is_null());

    host.fail_method(ExpandOutOfPinRequest::METHOD, Status::internal("gone"));
    assert!(owner.expand_out_of_pin(0).is_null());
}

#[test]
fn graphs_list_find_copy_and_clear() {
    let host = FakeHost::new();
    let channel = host.channel();
    let root = NodeGraph::root_node_graph(&channel).unwrap();
    let sub = NodeGraph::create(&root, 3).unwrap();
    assert!(sub.is_graph().unwrap());
    let lamp = host.add_item(ObjectType::Item, "lamp", sub.object_ref());
    host.add_item(ObjectType::Item, "lamp", host.root());

    assert_eq!(root.owned_items().unwrap().len(), 2);
    assert_eq!(root.find_items_by_name("lamp", false).unwrap().len(), 1);
    let everywhere = root.find_items_by_name("lamp", true).unwrap();
    assert_eq!(everywhere.len(), 2);
    assert!(everywhere.iter().any(|i| i.object_handle() == lamp.handle));

    let copy = root.copy_item_tree(&sub).unwrap();
    assert_ne!(copy.object_handle(), sub.object_handle());
    assert!(copy.is_graph().unwrap());
    assert_eq!(copy.to_graph().owned_items().unwrap().len(), 1);

    root.unfold().unwrap();
    assert!(!host.is_live(sub.object_handle()));
    assert_eq!(root.find_items_by_name("lamp", false).unwrap().len(), 3);

    root.clear().unwrap();
    assert!(root.owned_items().unwrap().is_empty());
    assert!(!host.is_live(lamp.handle));

    let item = Item::attached(host.add_item(ObjectType::Item, "leaf", host.root()), &channel);
    let err = NodeGraph::create(&item.to_graph(), 1).unwrap_err();
    assert!(err.is_invalid_argument());
}

#[test]
fn module_graph_linkers_create_nodes() {
    let host = FakeHost::new();
    let channel = host.channel();
    let graph_ref = host.add_item(ObjectType::ModuleNodeGraph, "module", host.root());
    let graph = ModuleNodeGraph::attached(graph_ref, &channel);

    let inputs = graph
        .set_input_linkers(&[
            LinkerInfo {
                name: "geometry".into(),
                pin_type: 4,
                label: "Geometry".into(),
            },
            LinkerInfo {
                name: "scale".into(),
                pin_type: 1,
                label: "Scale".into(),
            },
        ])
        .unwrap();
    assert_eq!(inputs.len(), 2);
    assert_eq!(inputs[0].name().unwrap(), "geometry");
    assert_eq!(inputs[1].out_type().unwrap(), 1);
    let outputs = graph
        .set_output_linkers(&[LinkerInfo {
            name: "out".into(),
            pin_type: 4,
            label: "Output".into(),
        }])
        .unwrap();
    assert_eq!(outputs.len(), 1);
    assert_eq!(graph.owned_items().unwrap().len(), 3);

    graph.set_evaluate_time_changes(true).unwrap();
    assert!(host.evaluates_time_changes(graph_ref));
}

#[test]
fn failures_keep_their_status_code() {
    let host = FakeHost::new();
    let channel = host.channel();
    let item = Item::attached(host.root(), &channel);

    host.fail_method(NameRequest::METHOD, Status::unavailable("renderer restarting"));
    match item.name().unwrap_err() {
        RpcError::Rpc { code, message } => {
            assert_eq!(code, StatusCode::Unavailable);
            assert_eq!(message, "renderer restarting");
        }
        other => panic!("unexpected error {other:?}"),
    }
    host.fail_method(NameRequest::METHOD, Status::invalid_argument("bad"));
    assert!(item.name().unwrap_err().is_invalid_argument());
}

#[test]
fn unreachable_host_reports_unavailable() {
    let transport = UnreachableTransport::new().unwrap();
    let channel = Channel::new(transport);
    let item = Item::attached(ObjectRef::new(ObjectType::Item, 5), &channel);

    let err = item.name().unwrap_err();
    assert_eq!(err.status_code(), Some(StatusCode::Unavailable), "{err}");
    assert!(!err.is_invalid_argument());
    assert!(item.to_graph().is_null());
}

#[test]
fn control_start_requires_a_callback_source() {
    let host = FakeHost::new();
    let control = ControlService::new(&host.channel());

    let err = control.start("").unwrap_err();
    assert!(err.is_invalid_argument(), "{err}");
    assert!(host.started_source().is_none());

    control.start("unix:/tmp/module.sock").unwrap();
    assert_eq!(host.started_source().as_deref(), Some("unix:/tmp/module.sock"));
    control.stop().unwrap();
    assert!(host.started_source().is_none());
}
