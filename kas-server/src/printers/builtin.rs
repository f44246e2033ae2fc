//! Per-kind printers for well-known workload and node kinds.
//!
//! Cell values follow the platform's own printers column for column, including the
//! wide columns, which always trail the regular ones.
use jiff::Timestamp;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::LabelSelector;
use kas_core::{
    duration::{parse_timestamp, since},
    dynamic::string_map,
    labels::{format_label_selector, format_labels},
    table::TableRowCondition,
    DynamicObject, Selector, TableColumnDefinition, TableRow,
};
use serde_json::Value;

use super::{age_cell, age_column, name_cell, name_column};

const NONE: &str = "<none>";

/// Kinds with a dedicated printer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    /// core `Pod`
    Pod,
    /// core `Node`
    Node,
    /// apps `Deployment`
    Deployment,
    /// apps `StatefulSet`
    StatefulSet,
    /// apps `DaemonSet`
    DaemonSet,
    /// apps `ReplicaSet`
    ReplicaSet,
}

impl Builtin {
    /// The printer for a group and kind, if there is one
    pub fn for_kind(group: &str, kind: &str) -> Option<Self> {
        match (group, kind) {
            ("", "Pod") => Some(Builtin::Pod),
            ("", "Node") => Some(Builtin::Node),
            ("apps", "Deployment") => Some(Builtin::Deployment),
            ("apps", "StatefulSet") => Some(Builtin::StatefulSet),
            ("apps", "DaemonSet") => Some(Builtin::DaemonSet),
            ("apps", "ReplicaSet") => Some(Builtin::ReplicaSet),
            _ => None,
        }
    }

    pub(super) fn columns(self) -> Vec<TableColumnDefinition> {
        use TableColumnDefinition as Col;
        let containers = || Col::string("Containers", "Names of each container in the template.").wide();
        let images = || Col::string("Images", "Images referenced by each container in the template.").wide();
        match self {
            Builtin::Pod => vec![
                name_column(),
                Col::string("Ready", "The aggregate readiness state of this pod for accepting traffic."),
                Col::string("Status", "The aggregate status of the containers in this pod."),
                Col::string(
                    "Restarts",
                    "The number of times the containers in this pod have been restarted and when the last \
                     container in this pod has restarted.",
                ),
                age_column(),
                Col::string("IP", "").wide(),
                Col::string("Node", "").wide(),
                Col::string("Nominated Node", "").wide(),
                Col::string("Readiness Gates", "").wide(),
            ],
            Builtin::Node => vec![
                name_column(),
                Col::string("Status", "The status of the node"),
                Col::string("Roles", "The roles of the node"),
                age_column(),
                Col::string("Version", "Kubelet Version reported by the node."),
                Col::string("Internal-IP", "The internal IP address of the node.").wide(),
                Col::string("External-IP", "The external IP address of the node.").wide(),
                Col::string(
                    "OS-Image",
                    "OS Image reported by the node from /etc/os-release (e.g. Debian GNU/Linux 7 (wheezy)).",
                )
                .wide(),
                Col::string(
                    "Kernel-Version",
                    "Kernel Version reported by the node from 'uname -r' (e.g. 3.16.0-0.bpo.4-amd64).",
                )
                .wide(),
                Col::string(
                    "Container-Runtime",
                    "Container runtime version reported by the node through runtime remote API (e.g. containerd://1.4.2).",
                )
                .wide(),
            ],
            Builtin::Deployment => vec![
                name_column(),
                Col::string("Ready", "Number of the pod with ready state"),
                Col::string(
                    "Up-to-date",
                    "Total number of non-terminated pods targeted by this deployment that have the desired template spec.",
                ),
                Col::string(
                    "Available",
                    "Total number of available pods (ready for at least minReadySeconds) targeted by this deployment.",
                ),
                age_column(),
                containers(),
                images(),
                Col::string(
                    "Selector",
                    "Label selector for pods. Existing ReplicaSets whose pods are selected by this will be the \
                     ones affected by this deployment.",
                )
                .wide(),
            ],
            Builtin::StatefulSet => vec![
                name_column(),
                Col::string("Ready", "Number of the pod with ready state"),
                age_column(),
                containers(),
                images(),
            ],
            Builtin::DaemonSet => vec![
                name_column(),
                Col::typed(
                    "Desired",
                    "integer",
                    "The total number of nodes that should be running the daemon pod (including nodes correctly \
                     running the daemon pod).",
                ),
                Col::typed(
                    "Current",
                    "integer",
                    "The number of nodes that are running at least 1 daemon pod and are supposed to run the daemon pod.",
                ),
                Col::typed(
                    "Ready",
                    "integer",
                    "The number of nodes that should be running the daemon pod and have one or more of the daemon \
                     pod running and ready.",
                ),
                Col::typed(
                    "Up-to-date",
                    "integer",
                    "The total number of nodes that are running updated daemon pod",
                ),
                Col::typed(
                    "Available",
                    "integer",
                    "The number of nodes that should be running the daemon pod and have one or more of the daemon \
                     pod running and available (ready for at least spec.minReadySeconds)",
                ),
                Col::string(
                    "Node Selector",
                    "NodeSelector is a selector which must be true for the pod to fit on a node. Selector which \
                     must match a node's labels for the pod to be scheduled on that node.",
                ),
                age_column(),
                containers(),
                images(),
                Col::string(
                    "Selector",
                    "A label query over pods that are managed by the daemon set. Must match in order to be controlled.",
                )
                .wide(),
            ],
            Builtin::ReplicaSet => vec![
                name_column(),
                Col::typed("Desired", "integer", "Replicas is the number of desired replicas."),
                Col::typed("Current", "integer", "Replicas is the most recently observed number of replicas."),
                Col::typed("Ready", "integer", "The number of ready replicas for this replica set."),
                age_column(),
                containers(),
                images(),
                Col::string(
                    "Selector",
                    "Selector is a label query over pods that should match the replica count.",
                )
                .wide(),
            ],
        }
    }

    pub(super) fn row(self, obj: &DynamicObject, now: Timestamp) -> TableRow {
        match self {
            Builtin::Pod => pod_row(obj, now),
            Builtin::Node => node_row(obj, now),
            Builtin::Deployment => deployment_row(obj, now),
            Builtin::StatefulSet => statefulset_row(obj, now),
            Builtin::DaemonSet => daemonset_row(obj, now),
            Builtin::ReplicaSet => replicaset_row(obj, now),
        }
    }
}

fn str_at<'a>(value: &'a Value, path: &str) -> Option<&'a str> {
    kas_core::dynamic::lookup(value, path).and_then(Value::as_str)
}

fn i64_at(value: &Value, path: &str) -> Option<i64> {
    kas_core::dynamic::lookup(value, path).and_then(Value::as_i64)
}

fn or_none(value: Option<&str>) -> String {
    value.filter(|s| !s.is_empty()).unwrap_or(NONE).to_string()
}

fn pod_row(pod: &DynamicObject, now: Timestamp) -> TableRow {
    let mut row = TableRow::default();
    let total_containers = pod.lookup_array("spec.containers").len();
    let mut ready_containers = 0;
    let mut restarts = 0;
    let mut last_restart: Option<Timestamp> = None;
    let mut track_restart = |status: &Value| {
        if let Some(finished) = parse_timestamp(str_at(status, "lastState.terminated.finishedAt")) {
            if last_restart.is_none_or(|last| last < finished) {
                last_restart = Some(finished);
            }
        }
    };

    let phase = pod.lookup_str("status.phase").unwrap_or_default();
    let mut reason = match pod.lookup_str("status.reason") {
        Some(reason) if !reason.is_empty() => reason.to_string(),
        _ => phase.to_string(),
    };
    match phase {
        "Succeeded" => row.conditions = vec![TableRowCondition::completed("Succeeded", "The pod has completed successfully.")],
        "Failed" => row.conditions = vec![TableRowCondition::completed("Failed", "The pod failed.")],
        _ => {}
    }

    let init_total = pod.lookup_array("spec.initContainers").len();
    let mut initializing = false;
    for (i, container) in pod.lookup_array("status.initContainerStatuses").iter().enumerate() {
        restarts += i64_at(container, "restartCount").unwrap_or_default();
        track_restart(container);
        let terminated = kas_core::dynamic::lookup(container, "state.terminated").filter(|t| t.is_object());
        let exit_code = terminated.and_then(|t| i64_at(t, "exitCode")).unwrap_or_default();
        let waiting_reason = str_at(container, "state.waiting.reason").unwrap_or_default();
        match terminated {
            Some(_) if exit_code == 0 => continue,
            Some(terminated) => {
                reason = match str_at(terminated, "reason").filter(|r| !r.is_empty()) {
                    Some(r) => format!("Init:{r}"),
                    None => match i64_at(terminated, "signal").unwrap_or_default() {
                        0 => format!("Init:ExitCode:{exit_code}"),
                        signal => format!("Init:Signal:{signal}"),
                    },
                };
            }
            None if !waiting_reason.is_empty() && waiting_reason != "PodInitializing" => {
                reason = format!("Init:{waiting_reason}");
            }
            None => reason = format!("Init:{i}/{init_total}"),
        }
        initializing = true;
        break;
    }

    if !initializing {
        restarts = 0;
        let mut has_running = false;
        for container in pod.lookup_array("status.containerStatuses").iter().rev() {
            restarts += i64_at(container, "restartCount").unwrap_or_default();
            track_restart(container);
            let terminated = kas_core::dynamic::lookup(container, "state.terminated").filter(|t| t.is_object());
            let waiting_reason = str_at(container, "state.waiting.reason").filter(|r| !r.is_empty());
            let terminated_reason = terminated.and_then(|t| str_at(t, "reason")).filter(|r| !r.is_empty());
            if let Some(r) = waiting_reason {
                reason = r.to_string();
            } else if let Some(r) = terminated_reason {
                reason = r.to_string();
            } else if let Some(terminated) = terminated {
                reason = match i64_at(terminated, "signal").unwrap_or_default() {
                    0 => format!("ExitCode:{}", i64_at(terminated, "exitCode").unwrap_or_default()),
                    signal => format!("Signal:{signal}"),
                };
            } else if kas_core::dynamic::lookup(container, "ready").and_then(Value::as_bool) == Some(true)
                && kas_core::dynamic::lookup(container, "state.running").is_some_and(Value::is_object)
            {
                has_running = true;
                ready_containers += 1;
            }
        }

        if reason == "Completed" && has_running {
            reason = if has_condition(pod, "Ready") {
                "Running".into()
            } else {
                "NotReady".into()
            };
        }
    }

    if pod.lookup("metadata.deletionTimestamp").is_some_and(|t| !t.is_null()) {
        reason = if pod.lookup_str("status.reason") == Some("NodeLost") {
            "Unknown".into()
        } else {
            "Terminating".into()
        };
    }

    let restarts = match last_restart {
        Some(at) => format!("{restarts} ({} ago)", since(Some(at), now)),
        None => restarts.to_string(),
    };

    let pod_ip = pod
        .lookup_array("status.podIPs")
        .first()
        .and_then(|ip| str_at(ip, "ip"));
    let gates = pod.lookup_array("spec.readinessGates");
    let readiness_gates = if gates.is_empty() {
        NONE.to_string()
    } else {
        let conditions = pod.lookup_array("status.conditions");
        let satisfied = gates
            .iter()
            .filter_map(|gate| str_at(gate, "conditionType"))
            .filter(|gate| {
                conditions
                    .iter()
                    .find(|c| str_at(c, "type") == Some(*gate))
                    .is_some_and(|c| str_at(c, "status") == Some("True"))
            })
            .count();
        format!("{satisfied}/{}", gates.len())
    };

    row.cells = vec![
        name_cell(pod),
        format!("{ready_containers}/{total_containers}").into(),
        reason.into(),
        restarts.into(),
        age_cell(pod, now),
        or_none(pod_ip).into(),
        or_none(pod.lookup_str("spec.nodeName")).into(),
        or_none(pod.lookup_str("status.nominatedNodeName")).into(),
        readiness_gates.into(),
    ];
    row
}

fn has_condition(obj: &DynamicObject, type_: &str) -> bool {
    obj.lookup_array("status.conditions")
        .iter()
        .any(|c| str_at(c, "type") == Some(type_) && str_at(c, "status") == Some("True"))
}

fn node_row(node: &DynamicObject, now: Timestamp) -> TableRow {
    let ready = node
        .lookup_array("status.conditions")
        .iter()
        .find(|c| str_at(c, "type") == Some("Ready"));
    let mut status = vec![match ready {
        Some(c) if str_at(c, "status") == Some("True") => "Ready",
        Some(_) => "NotReady",
        None => "Unknown",
    }];
    if node.lookup_bool("spec.unschedulable") == Some(true) {
        status.push("SchedulingDisabled");
    }

    let mut roles: Vec<String> = node
        .labels()
        .into_iter()
        .filter_map(|(key, value)| {
            if let Some(role) = key.strip_prefix("node-role.kubernetes.io/") {
                Some(role.to_string())
            } else if key == "kubernetes.io/role" {
                Some(value)
            } else {
                None
            }
        })
        .filter(|role| !role.is_empty())
        .collect();
    roles.sort();
    roles.dedup();
    let roles = if roles.is_empty() { NONE.to_string() } else { roles.join(",") };

    let address = |type_: &str| {
        node.lookup_array("status.addresses")
            .iter()
            .find(|a| str_at(a, "type") == Some(type_))
            .and_then(|a| str_at(a, "address"))
    };
    let info = |field: &str| {
        node.lookup_str(&format!("status.nodeInfo.{field}"))
            .filter(|s| !s.is_empty())
            .unwrap_or("<unknown>")
            .to_string()
    };

    TableRow {
        cells: vec![
            name_cell(node),
            status.join(",").into(),
            roles.into(),
            age_cell(node, now),
            node.lookup_str("status.nodeInfo.kubeletVersion").unwrap_or_default().into(),
            or_none(address("InternalIP")).into(),
            or_none(address("ExternalIP")).into(),
            info("osImage").into(),
            info("kernelVersion").into(),
            info("containerRuntimeVersion").into(),
        ],
        ..TableRow::default()
    }
}

/// Comma joined names and images of the pod template's containers
fn container_cells(obj: &DynamicObject) -> (String, String) {
    let containers = obj.lookup_array("spec.template.spec.containers");
    let field = |name: &str| {
        containers
            .iter()
            .map(|c| str_at(c, name).unwrap_or_default())
            .collect::<Vec<_>>()
            .join(",")
    };
    (field("name"), field("image"))
}

fn label_selector(obj: &DynamicObject) -> Option<Result<LabelSelector, serde_json::Error>> {
    obj.lookup("spec.selector")
        .filter(|s| !s.is_null())
        .map(|s| serde_json::from_value(s.clone()))
}

fn deployment_row(obj: &DynamicObject, now: Timestamp) -> TableRow {
    let desired = obj.lookup_i64("spec.replicas").unwrap_or_default();
    let ready = obj.lookup_i64("status.readyReplicas").unwrap_or_default();
    let (containers, images) = container_cells(obj);
    let selector = match label_selector(obj) {
        None => String::new(),
        Some(Ok(selector)) => match Selector::try_from(&selector) {
            Ok(s) => s.to_string(),
            Err(_) => "<invalid>".into(),
        },
        Some(Err(_)) => "<invalid>".into(),
    };
    TableRow {
        cells: vec![
            name_cell(obj),
            format!("{ready}/{desired}").into(),
            obj.lookup_i64("status.updatedReplicas").unwrap_or_default().into(),
            obj.lookup_i64("status.availableReplicas").unwrap_or_default().into(),
            age_cell(obj, now),
            containers.into(),
            images.into(),
            selector.into(),
        ],
        ..TableRow::default()
    }
}

fn statefulset_row(obj: &DynamicObject, now: Timestamp) -> TableRow {
    let desired = obj.lookup_i64("spec.replicas").unwrap_or_default();
    let ready = obj.lookup_i64("status.readyReplicas").unwrap_or_default();
    let (containers, images) = container_cells(obj);
    TableRow {
        cells: vec![
            name_cell(obj),
            format!("{ready}/{desired}").into(),
            age_cell(obj, now),
            containers.into(),
            images.into(),
        ],
        ..TableRow::default()
    }
}

fn formatted_selector(obj: &DynamicObject) -> String {
    match label_selector(obj) {
        None => format_label_selector(None),
        Some(Ok(selector)) => format_label_selector(Some(&selector)),
        Some(Err(_)) => "<error>".into(),
    }
}

fn daemonset_row(obj: &DynamicObject, now: Timestamp) -> TableRow {
    let status = |field: &str| Value::from(obj.lookup_i64(&format!("status.{field}")).unwrap_or_default());
    let node_selector = string_map(obj.lookup("spec.template.spec.nodeSelector"));
    let (containers, images) = container_cells(obj);
    TableRow {
        cells: vec![
            name_cell(obj),
            status("desiredNumberScheduled"),
            status("currentNumberScheduled"),
            status("numberReady"),
            status("updatedNumberScheduled"),
            status("numberAvailable"),
            format_labels(&node_selector).into(),
            age_cell(obj, now),
            containers.into(),
            images.into(),
            formatted_selector(obj).into(),
        ],
        ..TableRow::default()
    }
}

fn replicaset_row(obj: &DynamicObject, now: Timestamp) -> TableRow {
    let (containers, images) = container_cells(obj);
    TableRow {
        cells: vec![
            name_cell(obj),
            obj.lookup_i64("spec.replicas").unwrap_or_default().into(),
            obj.lookup_i64("status.replicas").unwrap_or_default().into(),
            obj.lookup_i64("status.readyReplicas").unwrap_or_default().into(),
            age_cell(obj, now),
            containers.into(),
            images.into(),
            formatted_selector(obj).into(),
        ],
        ..TableRow::default()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;

    fn now() -> Timestamp {
        "2024-01-01T12:00:00Z".parse().unwrap()
    }

    fn cells(kind: Builtin, data: Value) -> Vec<Value> {
        let row = kind.row(&DynamicObject::from_value(data), now());
        assert_eq!(row.cells.len(), kind.columns().len());
        row.cells
    }

    #[test]
    fn empty_running_pod() {
        let pod = json!({
            "apiVersion": "v1",
            "kind": "Pod",
            "metadata": { "name": "p" },
            "spec": { "containers": [] },
            "status": { "phase": "Running" },
        });
        assert_eq!(
            cells(Builtin::Pod, pod),
            vec![
                json!("p"),
                json!("0/0"),
                json!("Running"),
                json!("0"),
                json!("<unknown>"),
                json!("<none>"),
                json!("<none>"),
                json!("<none>"),
                json!("<none>"),
            ]
        );
    }

    #[test]
    fn running_pod_with_restarts_and_gates() {
        let pod = json!({
            "metadata": { "name": "web", "creationTimestamp": "2024-01-01T10:00:00Z" },
            "spec": {
                "nodeName": "node-1",
                "containers": [{ "name": "app" }, { "name": "sidecar" }],
                "readinessGates": [{ "conditionType": "example.com/ready" }, { "conditionType": "example.com/lb" }],
            },
            "status": {
                "phase": "Running",
                "podIPs": [{ "ip": "10.0.0.5" }],
                "conditions": [
                    { "type": "Ready", "status": "True" },
                    { "type": "example.com/ready", "status": "True" },
                    { "type": "example.com/lb", "status": "False" },
                ],
                "containerStatuses": [
                    {
                        "name": "app",
                        "ready": true,
                        "restartCount": 2,
                        "state": { "running": { "startedAt": "2024-01-01T11:00:00Z" } },
                        "lastState": { "terminated": { "exitCode": 1, "finishedAt": "2024-01-01T11:55:00Z" } },
                    },
                    {
                        "name": "sidecar",
                        "ready": false,
                        "restartCount": 1,
                        "state": { "waiting": { "reason": "CrashLoopBackOff" } },
                    },
                ],
            },
        });
        assert_eq!(
            cells(Builtin::Pod, pod),
            vec![
                json!("web"),
                json!("1/2"),
                json!("CrashLoopBackOff"),
                json!("3 (5m ago)"),
                json!("120m"),
                json!("10.0.0.5"),
                json!("node-1"),
                json!("<none>"),
                json!("1/2"),
            ]
        );
    }

    #[test]
    fn init_container_states() {
        let pod = |statuses: Value| {
            json!({
                "metadata": { "name": "p" },
                "spec": { "initContainers": [{ "name": "a" }, { "name": "b" }], "containers": [{ "name": "c" }] },
                "status": { "phase": "Pending", "initContainerStatuses": statuses },
            })
        };
        let status = |data| cells(Builtin::Pod, data)[2].clone();

        let done = json!({ "state": { "terminated": { "exitCode": 0 } } });
        assert_eq!(status(pod(json!([done, { "state": { "running": {} } }]))), json!("Init:1/2"));
        assert_eq!(
            status(pod(json!([{ "state": { "waiting": { "reason": "ImagePullBackOff" } } }]))),
            json!("Init:ImagePullBackOff")
        );
        assert_eq!(
            status(pod(json!([{ "state": { "waiting": { "reason": "PodInitializing" } } }]))),
            json!("Init:0/2")
        );
        assert_eq!(
            status(pod(json!([done, { "state": { "terminated": { "exitCode": 3, "reason": "Error" } } }]))),
            json!("Init:Error")
        );
        assert_eq!(
            status(pod(json!([{ "state": { "terminated": { "exitCode": 137, "signal": 9 } } }]))),
            json!("Init:Signal:9")
        );
        assert_eq!(
            status(pod(json!([{ "state": { "terminated": { "exitCode": 2 } } }]))),
            json!("Init:ExitCode:2")
        );
    }

    #[test]
    fn completed_and_terminating_pods() {
        let succeeded = DynamicObject::from_value(json!({
            "metadata": { "name": "job" },
            "spec": { "containers": [{ "name": "c" }] },
            "status": {
                "phase": "Succeeded",
                "containerStatuses": [{ "state": { "terminated": { "exitCode": 0, "reason": "Completed" } } }],
            },
        }));
        let row = Builtin::Pod.row(&succeeded, now());
        assert_eq!(row.cells[2], json!("Completed"));
        assert_eq!(row.conditions, vec![TableRowCondition::completed("Succeeded", "The pod has completed successfully.")]);

        let still_running = json!({
            "metadata": { "name": "p" },
            "spec": { "containers": [{ "name": "a" }, { "name": "b" }] },
            "status": {
                "phase": "Running",
                "conditions": [{ "type": "Ready", "status": "False" }],
                "containerStatuses": [
                    { "ready": true, "state": { "running": {} } },
                    { "state": { "terminated": { "exitCode": 0, "reason": "Completed" } } },
                ],
            },
        });
        assert_eq!(cells(Builtin::Pod, still_running)[2], json!("NotReady"));

        let deleted = json!({
            "metadata": { "name": "p", "deletionTimestamp": "2024-01-01T11:00:00Z" },
            "spec": { "containers": [] },
            "status": { "phase": "Running" },
        });
        assert_eq!(cells(Builtin::Pod, deleted)[2], json!("Terminating"));

        let lost = json!({
            "metadata": { "name": "p", "deletionTimestamp": "2024-01-01T11:00:00Z" },
            "spec": { "containers": [] },
            "status": { "phase": "Running", "reason": "NodeLost" },
        });
        assert_eq!(cells(Builtin::Pod, lost)[2], json!("Unknown"));

        let failed = DynamicObject::from_value(json!({
            "metadata": { "name": "p" },
            "status": { "phase": "Failed", "reason": "Evicted" },
        }));
        let row = Builtin::Pod.row(&failed, now());
        assert_eq!(row.cells[2], json!("Evicted"));
        assert_eq!(row.conditions[0].reason.as_deref(), Some("Failed"));
    }

    #[test]
    fn deployments() {
        let deployment = json!({
            "metadata": { "name": "web", "creationTimestamp": "2024-01-01T11:59:00Z" },
            "spec": {
                "replicas": 3,
                "selector": { "matchLabels": { "app": "web" } },
                "template": { "spec": { "containers": [
                    { "name": "app", "image": "web:1" },
                    { "name": "proxy", "image": "envoy:2" },
                ] } },
            },
            "status": { "readyReplicas": 2, "updatedReplicas": 3, "availableReplicas": 2 },
        });
        assert_eq!(
            cells(Builtin::Deployment, deployment),
            vec![
                json!("web"),
                json!("2/3"),
                json!(3),
                json!(2),
                json!("60s"),
                json!("app,proxy"),
                json!("web:1,envoy:2"),
                json!("app=web"),
            ]
        );

        let invalid = json!({
            "metadata": { "name": "bad" },
            "spec": { "selector": { "matchExpressions": [{ "key": "app", "operator": "Bogus" }] } },
        });
        let row = cells(Builtin::Deployment, invalid);
        assert_eq!(row[1], json!("0/0"));
        assert_eq!(row[7], json!("<invalid>"));

        let unselected = cells(Builtin::Deployment, json!({ "metadata": { "name": "none" } }));
        assert_eq!(unselected[7], json!(""));
    }

    #[test]
    fn statefulsets() {
        let sts = json!({
            "metadata": { "name": "db" },
            "spec": { "replicas": 2, "template": { "spec": { "containers": [{ "name": "pg", "image": "postgres:16" }] } } },
            "status": { "readyReplicas": 1 },
        });
        assert_eq!(
            cells(Builtin::StatefulSet, sts),
            vec![json!("db"), json!("1/2"), json!("<unknown>"), json!("pg"), json!("postgres:16")]
        );
    }

    #[test]
    fn daemonsets() {
        let ds = json!({
            "metadata": { "name": "agent" },
            "spec": {
                "selector": {
                    "matchLabels": { "app": "agent" },
                    "matchExpressions": [{ "key": "tier", "operator": "In", "values": ["a", "b"] }],
                },
                "template": { "spec": {
                    "nodeSelector": { "kubernetes.io/os": "linux", "disk": "ssd" },
                    "containers": [{ "name": "agent", "image": "agent:1" }],
                } },
            },
            "status": {
                "desiredNumberScheduled": 5,
                "currentNumberScheduled": 4,
                "numberReady": 3,
                "updatedNumberScheduled": 2,
                "numberAvailable": 1,
            },
        });
        assert_eq!(
            cells(Builtin::DaemonSet, ds),
            vec![
                json!("agent"),
                json!(5),
                json!(4),
                json!(3),
                json!(2),
                json!(1),
                json!("disk=ssd,kubernetes.io/os=linux"),
                json!("<unknown>"),
                json!("agent"),
                json!("agent:1"),
                json!("app=agent,tier in (a,b)"),
            ]
        );

        let bare = cells(Builtin::DaemonSet, json!({ "metadata": { "name": "bare" } }));
        assert_eq!(bare[6], json!("<none>"));
        assert_eq!(bare[10], json!("<none>"));
    }

    #[test]
    fn replicasets() {
        let rs = json!({
            "metadata": { "name": "web-abc" },
            "spec": {
                "replicas": 2,
                "selector": { "matchLabels": { "app": "web" } },
                "template": { "spec": { "containers": [{ "name": "app", "image": "web:1" }] } },
            },
            "status": { "replicas": 2, "readyReplicas": 1 },
        });
        assert_eq!(
            cells(Builtin::ReplicaSet, rs),
            vec![
                json!("web-abc"),
                json!(2),
                json!(2),
                json!(1),
                json!("<unknown>"),
                json!("app"),
                json!("web:1"),
                json!("app=web"),
            ]
        );
    }

    #[test]
    fn nodes() {
        let node = json!({
            "metadata": {
                "name": "node-1",
                "labels": {
                    "node-role.kubernetes.io/worker": "",
                    "node-role.kubernetes.io/control-plane": "",
                    "kubernetes.io/role": "infra",
                },
            },
            "spec": { "unschedulable": true },
            "status": {
                "conditions": [{ "type": "MemoryPressure", "status": "False" }, { "type": "Ready", "status": "True" }],
                "addresses": [{ "type": "InternalIP", "address": "10.0.0.1" }, { "type": "Hostname", "address": "node-1" }],
                "nodeInfo": { "kubeletVersion": "v1.30.1", "osImage": "Fedora", "containerRuntimeVersion": "cri-o://1.30" },
            },
        });
        assert_eq!(
            cells(Builtin::Node, node),
            vec![
                json!("node-1"),
                json!("Ready,SchedulingDisabled"),
                json!("control-plane,infra,worker"),
                json!("<unknown>"),
                json!("v1.30.1"),
                json!("10.0.0.1"),
                json!("<none>"),
                json!("Fedora"),
                json!("<unknown>"),
                json!("cri-o://1.30"),
            ]
        );

        let fresh = cells(Builtin::Node, json!({ "metadata": { "name": "n" } }));
        assert_eq!(fresh[1], json!("Unknown"));
        assert_eq!(fresh[2], json!("<none>"));
    }
}
