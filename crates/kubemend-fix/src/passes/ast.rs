//! Pass 2: AST reconstruction.
//!
//! The one pass that works on the object model instead of the text. It
//! parses the (hopefully now parseable) buffer, repairs each document at
//! the object level, and re-serializes in canonical key order. When the
//! buffer still does not parse the pass is a no-op; when it parses but
//! nothing needs repair the text passes through byte-identical so clean
//! inputs keep their comments and formatting.

use serde::Deserialize;
use serde_yaml::{Mapping, Value};

use kubemend_knowledge::{KNOWN_KINDS, is_valid_top_level_field};

use crate::change::{Category, Change, ChangeLog, Severity};
use crate::serialize;

const WORKLOAD_KINDS: &[&str] = &["Deployment", "ReplicaSet", "DaemonSet", "StatefulSet", "Job"];

/// Kinds that are not namespaced; they never get a `metadata.namespace`.
const CLUSTER_SCOPED_KINDS: &[&str] = &[
    "ClusterRole",
    "ClusterRoleBinding",
    "Namespace",
    "PersistentVolume",
    "StorageClass",
];

const ROOT_METADATA_KEYS: &[&str] = &["name", "labels", "annotations", "namespace"];

#[tracing::instrument(skip_all)]
pub fn run(text: &str, log: &mut ChangeLog) -> String {
    let Ok(mut docs) = parse_documents(text) else {
        tracing::debug!("buffer does not parse yet; AST pass skipped");
        return text.to_string();
    };
    let before = log.len();
    for doc in &mut docs {
        if let Value::Mapping(map) = doc {
            repair_document(map, log);
        }
    }
    if log.len() == before {
        return text.to_string();
    }
    tracing::debug!(changes = log.len() - before, "re-serializing in canonical order");
    serialize::emit_documents(&docs)
}

fn parse_documents(text: &str) -> Result<Vec<Value>, serde_yaml::Error> {
    serde_yaml::Deserializer::from_str(text)
        .map(Value::deserialize)
        .collect()
}

fn repair_document(map: &mut Mapping, log: &mut ChangeLog) {
    infer_kind(map, log);
    upgrade_deprecated_apis(map, log);
    infer_api_version(map, log);
    hoist_root_spec_fields(map, log);
    repair_workload_structure(map, log);
    inject_required_fields(map, log);
    normalize_enums(map, log);
    clean_root_metadata(map, log);
    remove_unexpected_root_fields(map, log);
}

// -----------------------------------------------------------------------
// Small object-model helpers
// -----------------------------------------------------------------------

fn str_of<'a>(map: &'a Mapping, key: &str) -> Option<&'a str> {
    map.get(key).and_then(Value::as_str)
}

fn map_of_mut<'a>(map: &'a mut Mapping, key: &str) -> Option<&'a mut Mapping> {
    map.get_mut(key).and_then(Value::as_mapping_mut)
}

fn ensure_mapping<'a>(map: &'a mut Mapping, key: &str) -> &'a mut Mapping {
    if !matches!(map.get(key), Some(Value::Mapping(_))) {
        map.insert(key.into(), Value::Mapping(Mapping::new()));
    }
    map.get_mut(key)
        .and_then(Value::as_mapping_mut)
        .expect("mapping was just ensured")
}

fn descend_mut<'a>(map: &'a mut Mapping, path: &[&str]) -> Option<&'a mut Mapping> {
    let mut current = map;
    for key in path {
        current = current.get_mut(*key)?.as_mapping_mut()?;
    }
    Some(current)
}

/// A short rendering of a value for change records.
fn brief(key: &str, value: &Value) -> String {
    match value {
        Value::String(s) => format!("{key}: {s}"),
        Value::Number(n) => format!("{key}: {n}"),
        Value::Bool(b) => format!("{key}: {b}"),
        _ => format!("{key}: …"),
    }
}

// -----------------------------------------------------------------------
// Kind and apiVersion inference
// -----------------------------------------------------------------------

fn infer_kind(map: &mut Mapping, log: &mut ChangeLog) {
    if map.contains_key("kind") {
        return;
    }
    let spec = map.get("spec").and_then(Value::as_mapping);
    let kind = if spec.is_some_and(|s| s.contains_key("template")) {
        "Deployment"
    } else if spec.is_some_and(|s| s.contains_key("containers")) || map.contains_key("containers") {
        "Pod"
    } else if map.contains_key("data") || map.contains_key("binaryData") {
        "ConfigMap"
    } else {
        "Pod"
    };
    map.insert("kind".into(), kind.into());
    log.push(Change::missing(
        format!("kind: {kind}"),
        format!("inferred kind `{kind}` from document shape"),
        Severity::Error,
        0.8,
    ));
}

fn api_version_for(kind: &str) -> &'static str {
    match kind {
        "Deployment" | "StatefulSet" | "DaemonSet" | "ReplicaSet" => "apps/v1",
        "Job" | "CronJob" => "batch/v1",
        "Ingress" => "networking.k8s.io/v1",
        _ => "v1",
    }
}

fn infer_api_version(map: &mut Mapping, log: &mut ChangeLog) {
    if map.contains_key("apiVersion") {
        return;
    }
    let api = api_version_for(str_of(map, "kind").unwrap_or("Pod"));
    map.insert("apiVersion".into(), api.into());
    log.push(Change::missing(
        format!("apiVersion: {api}"),
        format!("inferred apiVersion `{api}` from kind"),
        Severity::Error,
        0.9,
    ));
}

// -----------------------------------------------------------------------
// Deprecated API upgrades
// -----------------------------------------------------------------------

fn upgrade_deprecated_apis(map: &mut Mapping, log: &mut ChangeLog) {
    let kind = str_of(map, "kind").unwrap_or_default().to_string();
    let api = str_of(map, "apiVersion").unwrap_or_default().to_string();

    match kind.as_str() {
        "Ingress" if api == "extensions/v1beta1" || api == "networking.k8s.io/v1beta1" => {
            replace_api_version(map, &api, "networking.k8s.io/v1", log);
            modernize_ingress_spec(map, log);
        }
        "CronJob" if api == "batch/v1beta1" => {
            replace_api_version(map, &api, "batch/v1", log);
        }
        _ => {}
    }
}

fn replace_api_version(map: &mut Mapping, from: &str, to: &str, log: &mut ChangeLog) {
    map.insert("apiVersion".into(), to.into());
    log.push(Change::new(
        1,
        format!("apiVersion: {from}"),
        format!("apiVersion: {to}"),
        format!("upgraded deprecated apiVersion `{from}`"),
        Category::Structure,
        Severity::Warning,
        0.95,
    ));
}

fn modernize_ingress_spec(map: &mut Mapping, log: &mut ChangeLog) {
    let Some(rules) = map_of_mut(map, "spec")
        .and_then(|spec| spec.get_mut("rules"))
        .and_then(Value::as_sequence_mut)
    else {
        return;
    };
    for rule in rules {
        let Some(paths) = rule
            .get_mut("http")
            .and_then(|http| http.get_mut("paths"))
            .and_then(Value::as_sequence_mut)
        else {
            continue;
        };
        for path in paths {
            let Some(entry) = path.as_mapping_mut() else {
                continue;
            };
            if !entry.contains_key("pathType") {
                entry.insert("pathType".into(), "Prefix".into());
                log.push(Change::missing(
                    "pathType: Prefix",
                    "networking.k8s.io/v1 paths require a pathType",
                    Severity::Warning,
                    0.9,
                ));
            }
            if let Some(backend) = map_of_mut(entry, "backend") {
                upgrade_backend(backend, log);
            }
        }
    }
}

fn upgrade_backend(backend: &mut Mapping, log: &mut ChangeLog) {
    let name = backend.remove("serviceName");
    let port = backend.remove("servicePort");
    if name.is_none() && port.is_none() {
        return;
    }
    let mut service = Mapping::new();
    if let Some(name) = name {
        service.insert("name".into(), name);
    }
    let mut port_map = Mapping::new();
    port_map.insert("number".into(), port.unwrap_or_else(|| Value::from(80)));
    service.insert("port".into(), Value::Mapping(port_map));
    backend.insert("service".into(), Value::Mapping(service));
    log.push(Change::new(
        1,
        "backend: serviceName/servicePort".to_string(),
        "backend: service.name/service.port.number".to_string(),
        "rewrote Ingress backend to the networking.k8s.io/v1 shape",
        Category::Structure,
        Severity::Error,
        0.9,
    ));
}

// -----------------------------------------------------------------------
// Root-level spec-field hoisting
// -----------------------------------------------------------------------

/// The syntax pass deliberately leaves `replicas`/`selector`/`template`/
/// `type` alone at column zero; here they are hoisted into `spec` for the
/// kinds where they belong there. `type` stays at the root for Secrets,
/// where it is a legitimate top-level field.
fn hoist_root_spec_fields(map: &mut Mapping, log: &mut ChangeLog) {
    let kind = str_of(map, "kind").unwrap_or_default().to_string();
    let is_workload = WORKLOAD_KINDS.contains(&kind.as_str());

    let hoistable: &[&str] = match kind.as_str() {
        "Service" => &["selector", "type"],
        _ if is_workload => &["replicas", "selector", "template"],
        _ => return,
    };

    for key in hoistable {
        if !map.contains_key(*key) {
            continue;
        }
        let Some(value) = map.remove(*key) else {
            continue;
        };
        let spec = ensure_mapping(map, "spec");
        if spec.contains_key(*key) {
            log.push(Change::removal(
                1,
                brief(key, &value),
                format!("removed root-level `{key}` duplicating spec.{key}"),
                Category::Structure,
                Severity::Warning,
                0.85,
            ));
        } else {
            let description = brief(key, &value);
            spec.insert((*key).into(), value);
            log.push(Change::new(
                1,
                description,
                format!("spec.{key}"),
                format!("moved root-level `{key}` into spec"),
                Category::Structure,
                Severity::Error,
                0.85,
            ));
        }
    }
}

// -----------------------------------------------------------------------
// Workload structure
// -----------------------------------------------------------------------

fn generated_labels() -> Value {
    let mut labels = Mapping::new();
    labels.insert("app".into(), "generated-app".into());
    Value::Mapping(labels)
}

fn repair_workload_structure(map: &mut Mapping, log: &mut ChangeLog) {
    let kind = str_of(map, "kind").unwrap_or_default().to_string();

    if kind == "Pod" {
        if let Some(containers) = map.remove("containers") {
            ensure_mapping(map, "spec").insert("containers".into(), containers);
            relocation_change("containers", "spec.containers", log);
        }
        return;
    }
    if !WORKLOAD_KINDS.contains(&kind.as_str()) {
        return;
    }

    if let Some(containers) = map.remove("containers") {
        let spec = ensure_mapping(map, "spec");
        let template_spec = ensure_mapping(ensure_mapping(spec, "template"), "spec");
        template_spec.insert("containers".into(), containers);
        relocation_change("containers", "spec.template.spec.containers", log);
    } else if let Some(spec) = map_of_mut(map, "spec")
        && spec.contains_key("containers")
        && !spec.contains_key("template")
        && let Some(containers) = spec.remove("containers")
    {
        let template_spec = ensure_mapping(ensure_mapping(spec, "template"), "spec");
        template_spec.insert("containers".into(), containers);
        relocation_change("spec.containers", "spec.template.spec.containers", log);
    }

    synthesize_selector_labels(map, log);
}

fn relocation_change(from: &str, to: &str, log: &mut ChangeLog) {
    log.push(Change::new(
        1,
        from.to_string(),
        to.to_string(),
        format!("relocated `{from}` to `{to}`"),
        Category::Structure,
        Severity::Error,
        0.85,
    ));
}

/// A workload with a pod template needs a selector matching the template
/// labels; synthesize both halves when absent.
fn synthesize_selector_labels(map: &mut Mapping, log: &mut ChangeLog) {
    let Some(spec) = map_of_mut(map, "spec") else {
        return;
    };
    if !spec.contains_key("template") {
        return;
    }

    let selector = ensure_mapping(spec, "selector");
    if !selector.contains_key("matchLabels") {
        selector.insert("matchLabels".into(), generated_labels());
        log.push(Change::missing(
            "spec.selector.matchLabels",
            "workload selectors must match the template labels",
            Severity::Error,
            0.85,
        ));
    }

    if let Some(template) = map_of_mut(spec, "template") {
        let metadata = ensure_mapping(template, "metadata");
        if !metadata.contains_key("labels") {
            metadata.insert("labels".into(), generated_labels());
            log.push(Change::missing(
                "spec.template.metadata.labels",
                "pod templates need labels for the selector to match",
                Severity::Error,
                0.85,
            ));
        }
    }
}

// -----------------------------------------------------------------------
// Required fields
// -----------------------------------------------------------------------

fn placeholder_container() -> Value {
    let mut container = Mapping::new();
    container.insert("name".into(), "app".into());
    container.insert("image".into(), "changeme-image".into());
    Value::Sequence(vec![Value::Mapping(container)])
}

fn needs_spec(kind: &str) -> bool {
    kind == "Pod" || kind == "Service" || kind == "CronJob" || WORKLOAD_KINDS.contains(&kind)
}

fn inject_required_fields(map: &mut Mapping, log: &mut ChangeLog) {
    let kind = str_of(map, "kind").unwrap_or("Pod").to_string();

    if !matches!(map.get("metadata"), Some(Value::Mapping(_))) {
        ensure_mapping(map, "metadata");
        log.push(Change::missing(
            "metadata",
            "every manifest needs a metadata block",
            Severity::Error,
            0.9,
        ));
    }
    let metadata = ensure_mapping(map, "metadata");
    if !metadata.contains_key("name") {
        metadata.insert("name".into(), "changeme-name".into());
        log.push(Change::missing(
            "metadata.name: changeme-name",
            "required field; the placeholder needs review",
            Severity::Error,
            0.8,
        ));
    }
    if !CLUSTER_SCOPED_KINDS.contains(&kind.as_str()) && !metadata.contains_key("namespace") {
        metadata.insert("namespace".into(), "default".into());
        log.push(Change::missing(
            "metadata.namespace: default",
            "namespaced kind without a namespace",
            Severity::Warning,
            0.8,
        ));
    }

    if needs_spec(&kind) && !matches!(map.get("spec"), Some(Value::Mapping(_))) {
        ensure_mapping(map, "spec");
        log.push(Change::missing(
            "spec",
            format!("a {kind} needs a spec"),
            Severity::Error,
            0.9,
        ));
    }

    if kind == "Pod" {
        let spec = ensure_mapping(map, "spec");
        ensure_containers(spec, "spec.containers", log);
    } else if WORKLOAD_KINDS.contains(&kind.as_str()) {
        let spec = ensure_mapping(map, "spec");
        let template_spec = ensure_mapping(ensure_mapping(spec, "template"), "spec");
        ensure_containers(template_spec, "spec.template.spec.containers", log);
        synthesize_selector_labels(map, log);
    }
}

fn ensure_containers(pod_spec: &mut Mapping, path: &str, log: &mut ChangeLog) {
    let populated = matches!(pod_spec.get("containers"), Some(Value::Sequence(s)) if !s.is_empty());
    if populated {
        return;
    }
    pod_spec.insert("containers".into(), placeholder_container());
    log.push(Change::missing(
        format!("{path}: [{{name: app, image: changeme-image}}]"),
        "workloads need at least one container; the placeholder needs review",
        Severity::Error,
        0.8,
    ));
}

// -----------------------------------------------------------------------
// Enum case normalization
// -----------------------------------------------------------------------

fn normalize_enum(
    value: &mut Value,
    allowed: &'static [&'static str],
    field: &str,
    log: &mut ChangeLog,
) {
    let Some(current) = value.as_str() else {
        return;
    };
    if allowed.contains(&current) {
        return;
    }
    if let Some(canonical) = allowed.iter().find(|a| a.eq_ignore_ascii_case(current)) {
        log.push(Change::new(
            1,
            format!("{field}: {current}"),
            format!("{field}: {canonical}"),
            format!("normalized `{field}` to its canonical casing"),
            Category::Semantic,
            Severity::Warning,
            0.95,
        ));
        *value = Value::from(*canonical);
    }
}

fn normalize_pod_spec_enums(spec: &mut Mapping, log: &mut ChangeLog) {
    if let Some(policy) = spec.get_mut("restartPolicy") {
        normalize_enum(policy, &["Always", "OnFailure", "Never"], "restartPolicy", log);
    }
    for list in ["containers", "initContainers"] {
        let Some(containers) = spec.get_mut(list).and_then(Value::as_sequence_mut) else {
            continue;
        };
        for container in containers {
            let Some(container) = container.as_mapping_mut() else {
                continue;
            };
            if let Some(policy) = container.get_mut("imagePullPolicy") {
                normalize_enum(
                    policy,
                    &["Always", "IfNotPresent", "Never"],
                    "imagePullPolicy",
                    log,
                );
            }
            normalize_port_protocols(container, log);
        }
    }
}

fn normalize_port_protocols(map: &mut Mapping, log: &mut ChangeLog) {
    let Some(ports) = map.get_mut("ports").and_then(Value::as_sequence_mut) else {
        return;
    };
    for port in ports {
        if let Some(port) = port.as_mapping_mut()
            && let Some(protocol) = port.get_mut("protocol")
        {
            normalize_enum(protocol, &["TCP", "UDP", "SCTP"], "protocol", log);
        }
    }
}

fn normalize_enums(map: &mut Mapping, log: &mut ChangeLog) {
    let kind = str_of(map, "kind").unwrap_or_default().to_string();

    if let Some(spec) = map_of_mut(map, "spec") {
        normalize_pod_spec_enums(spec, log);
        if let Some(template_spec) = descend_mut(spec, &["template", "spec"]) {
            normalize_pod_spec_enums(template_spec, log);
        }
        if let Some(job_pod_spec) = descend_mut(spec, &["jobTemplate", "spec", "template", "spec"])
        {
            normalize_pod_spec_enums(job_pod_spec, log);
        }
    }

    if kind == "Service"
        && let Some(spec) = map_of_mut(map, "spec")
    {
        if let Some(service_type) = spec.get_mut("type") {
            normalize_enum(
                service_type,
                &["ClusterIP", "NodePort", "LoadBalancer", "ExternalName"],
                "spec.type",
                log,
            );
        }
        normalize_port_protocols(spec, log);
    }
}

// -----------------------------------------------------------------------
// Root-metadata cleanup
// -----------------------------------------------------------------------

/// `name`, `labels`, `annotations`, and `namespace` do not belong at the
/// document root; promote them into `metadata` when metadata lacks them
/// (or still carries the injected placeholder) and drop the root copy.
fn clean_root_metadata(map: &mut Mapping, log: &mut ChangeLog) {
    for key in ROOT_METADATA_KEYS {
        if !map.contains_key(*key) {
            continue;
        }
        let Some(root_value) = map.remove(*key) else {
            continue;
        };
        let metadata = ensure_mapping(map, "metadata");
        let placeholder = match *key {
            "name" => Some("changeme-name"),
            "namespace" => Some("default"),
            _ => None,
        };
        let promote = match metadata.get(*key) {
            None => true,
            Some(existing) => placeholder.is_some_and(|p| {
                existing.as_str() == Some(p) && root_value.as_str() != Some(p)
            }),
        };
        if promote {
            let description = brief(key, &root_value);
            metadata.insert((*key).into(), root_value);
            log.push(Change::new(
                1,
                description,
                format!("metadata.{key}"),
                format!("promoted root-level `{key}` into metadata"),
                Category::Structure,
                Severity::Error,
                0.9,
            ));
        } else {
            log.push(Change::removal(
                1,
                brief(key, &root_value),
                format!("removed root-level `{key}` duplicating metadata.{key}"),
                Category::Structure,
                Severity::Warning,
                0.85,
            ));
        }
    }
}

/// Kinds whose root schema is field lists rather than a `spec` block
/// (`subsets`, `endpoints`, per-slice `ports`); stray-root removal would
/// guess wrong here, so it stands down.
const FREEFORM_ROOT_KINDS: &[&str] = &["Endpoints", "EndpointSlice"];

/// After the hoists and metadata cleanup have claimed everything they
/// recognize, any root key still outside `VALID_TOP_LEVEL_FIELDS` does not
/// belong in the document. Removal only runs for known kinds; an
/// unrecognized kind may legitimately carry root fields we cannot vouch
/// for.
fn remove_unexpected_root_fields(map: &mut Mapping, log: &mut ChangeLog) {
    let kind = str_of(map, "kind").unwrap_or_default().to_string();
    if !KNOWN_KINDS.contains(&kind.as_str()) || FREEFORM_ROOT_KINDS.contains(&kind.as_str()) {
        return;
    }
    let strays: Vec<String> = map
        .keys()
        .filter_map(Value::as_str)
        .filter(|key| !is_valid_top_level_field(key))
        .map(str::to_string)
        .collect();
    for key in strays {
        let Some(value) = map.remove(key.as_str()) else {
            continue;
        };
        log.push(Change::removal(
            1,
            brief(&key, &value),
            format!("removed `{key}`, which is not a valid root field for {kind}"),
            Category::Structure,
            Severity::Warning,
            0.75,
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::change::ChangeLog;

    fn fix(text: &str) -> (String, Vec<Change>) {
        let mut log = ChangeLog::new();
        let out = run(text, &mut log);
        (out, log.into_changes())
    }

    fn parse(text: &str) -> Value {
        serde_yaml::from_str(text).expect("output parses")
    }

    #[test]
    fn unparseable_input_passes_through() {
        let text = "key: [unclosed\n";
        let (out, changes) = fix(text);
        assert_eq!(out, text);
        assert!(changes.is_empty());
    }

    #[test]
    fn clean_document_passes_through_with_comments() {
        let text = "# keep me\napiVersion: v1\nkind: Namespace\nmetadata:\n  name: dev\n";
        let (out, changes) = fix(text);
        assert_eq!(out, text);
        assert!(changes.is_empty());
    }

    #[test]
    fn kind_is_inferred_from_template() {
        let (out, _) = fix("spec:\n  template:\n    spec:\n      containers:\n      - name: a\n        image: b\n");
        let doc = parse(&out);
        assert_eq!(doc["kind"], "Deployment");
        assert_eq!(doc["apiVersion"], "apps/v1");
    }

    #[test]
    fn kind_defaults_to_pod() {
        let (out, _) = fix("metadata:\n  name: x\n");
        let doc = parse(&out);
        assert_eq!(doc["kind"], "Pod");
        assert_eq!(doc["apiVersion"], "v1");
    }

    #[test]
    fn data_implies_config_map() {
        let (out, _) = fix("data:\n  key: value\n");
        let doc = parse(&out);
        assert_eq!(doc["kind"], "ConfigMap");
    }

    #[test]
    fn root_containers_move_into_template() {
        let text = "kind: Deployment\nmetadata:\n  name: web\ncontainers:\n- name: app\n  image: nginx\n";
        let (out, changes) = fix(text);
        let doc = parse(&out);
        assert_eq!(
            doc["spec"]["template"]["spec"]["containers"][0]["image"],
            "nginx"
        );
        assert_eq!(doc["spec"]["selector"]["matchLabels"]["app"], "generated-app");
        assert_eq!(
            doc["spec"]["template"]["metadata"]["labels"]["app"],
            "generated-app"
        );
        assert!(changes.iter().any(|c| c.category == Category::Structure));
    }

    #[test]
    fn ingress_upgrade_scenario() {
        let text = concat!(
            "apiVersion: extensions/v1beta1\n",
            "kind: Ingress\n",
            "metadata:\n  name: web\n",
            "spec:\n",
            "  rules:\n",
            "  - http:\n",
            "      paths:\n",
            "      - backend:\n",
            "          serviceName: foo\n",
            "          servicePort: 80\n",
        );
        let (out, _) = fix(text);
        let doc = parse(&out);
        assert_eq!(doc["apiVersion"], "networking.k8s.io/v1");
        let path = &doc["spec"]["rules"][0]["http"]["paths"][0];
        assert_eq!(path["pathType"], "Prefix");
        assert_eq!(path["backend"]["service"]["name"], "foo");
        assert_eq!(path["backend"]["service"]["port"]["number"], 80);
        assert!(path["backend"].get("serviceName").is_none());
    }

    #[test]
    fn cron_job_api_is_upgraded() {
        let text = "apiVersion: batch/v1beta1\nkind: CronJob\nmetadata:\n  name: tick\nspec:\n  schedule: \"* * * * *\"\n";
        let (out, _) = fix(text);
        let doc = parse(&out);
        assert_eq!(doc["apiVersion"], "batch/v1");
    }

    #[test]
    fn required_fields_are_injected() {
        let (out, changes) = fix("kind: Deployment\n");
        let doc = parse(&out);
        assert_eq!(doc["metadata"]["name"], "changeme-name");
        assert_eq!(doc["metadata"]["namespace"], "default");
        assert_eq!(
            doc["spec"]["template"]["spec"]["containers"][0]["image"],
            "changeme-image"
        );
        assert!(changes.iter().all(|c| c.line == 1));
    }

    #[test]
    fn cluster_scoped_kinds_get_no_namespace() {
        let (out, _) = fix("kind: Namespace\nmetadata:\n  name: dev\napiVersion: v1\n");
        let doc = parse(&out);
        assert!(doc["metadata"].get("namespace").is_none());
    }

    #[test]
    fn enum_case_is_normalized() {
        let text = concat!(
            "apiVersion: v1\n",
            "kind: Pod\n",
            "metadata:\n  name: x\n  namespace: default\n",
            "spec:\n",
            "  restartPolicy: always\n",
            "  containers:\n",
            "  - name: app\n",
            "    image: nginx\n",
            "    imagePullPolicy: ifnotpresent\n",
            "    ports:\n",
            "    - containerPort: 80\n",
            "      protocol: tcp\n",
        );
        let (out, changes) = fix(text);
        let doc = parse(&out);
        assert_eq!(doc["spec"]["restartPolicy"], "Always");
        assert_eq!(doc["spec"]["containers"][0]["imagePullPolicy"], "IfNotPresent");
        assert_eq!(doc["spec"]["containers"][0]["ports"][0]["protocol"], "TCP");
        assert!(changes.iter().all(|c| c.category == Category::Semantic));
    }

    #[test]
    fn service_type_is_normalized() {
        let text = "apiVersion: v1\nkind: Service\nmetadata:\n  name: s\n  namespace: default\nspec:\n  type: clusterip\n  ports:\n  - port: 80\n    protocol: udp\n";
        let (out, _) = fix(text);
        let doc = parse(&out);
        assert_eq!(doc["spec"]["type"], "ClusterIP");
        assert_eq!(doc["spec"]["ports"][0]["protocol"], "UDP");
    }

    #[test]
    fn stray_root_name_scenario() {
        let (out, changes) = fix("name: foo\nkind: Pod\nmetadata:\n  name: changeme-name\n");
        let doc = parse(&out);
        assert_eq!(doc["metadata"]["name"], "foo");
        assert!(doc.get("name").is_none());
        let promotions: Vec<_> = changes
            .iter()
            .filter(|c| c.reason.contains("promoted root-level `name`"))
            .collect();
        assert_eq!(promotions.len(), 1);
        assert_eq!(promotions[0].category, Category::Structure);
        assert_eq!(promotions[0].severity, Severity::Error);
    }

    #[test]
    fn duplicate_root_labels_are_dropped() {
        let text = "kind: Pod\nlabels:\n  app: old\nmetadata:\n  name: x\n  labels:\n    app: new\n";
        let (out, changes) = fix(text);
        let doc = parse(&out);
        assert_eq!(doc["metadata"]["labels"]["app"], "new");
        assert!(doc.get("labels").is_none());
        assert!(changes.iter().any(|c| c.fixed == crate::change::REMOVED));
    }

    #[test]
    fn stray_root_replicas_moves_into_spec() {
        let text = "apiVersion: apps/v1\nkind: Deployment\nmetadata:\n  name: web\n  namespace: default\nreplicas: 3\nspec:\n  selector:\n    matchLabels:\n      app: web\n  template:\n    metadata:\n      labels:\n        app: web\n    spec:\n      containers:\n      - name: app\n        image: nginx\n";
        let (out, changes) = fix(text);
        let doc = parse(&out);
        assert_eq!(doc["spec"]["replicas"], 3);
        assert!(doc.get("replicas").is_none());
        assert!(changes.iter().any(|c| c.reason.contains("moved root-level `replicas`")));
    }

    #[test]
    fn secret_type_stays_at_root() {
        let text = "apiVersion: v1\nkind: Secret\nmetadata:\n  name: s\n  namespace: default\ntype: Opaque\ndata:\n  k: dg==\n";
        let (out, changes) = fix(text);
        assert_eq!(out, text);
        assert!(changes.is_empty());
    }

    #[test]
    fn unexpected_root_field_is_removed() {
        let text = "apiVersion: v1\nkind: ConfigMap\nmetadata:\n  name: c\n  namespace: default\nrandomJunk: foo\ndata:\n  k: v\n";
        let (out, changes) = fix(text);
        let doc = parse(&out);
        assert!(doc.get("randomJunk").is_none());
        assert_eq!(doc["data"]["k"], "v");
        let removals: Vec<_> = changes
            .iter()
            .filter(|c| c.reason.contains("not a valid root field"))
            .collect();
        assert_eq!(removals.len(), 1);
        assert_eq!(removals[0].fixed, crate::change::REMOVED);
        assert_eq!(removals[0].severity, Severity::Warning);
    }

    #[test]
    fn unknown_kinds_keep_their_root_fields() {
        let text = "apiVersion: example.com/v1\nkind: Widget\nmetadata:\n  name: w\n  namespace: default\nwidgetClass: round\n";
        let (out, changes) = fix(text);
        assert_eq!(out, text);
        assert!(changes.is_empty());
    }

    #[test]
    fn multi_document_streams_are_repaired_per_document() {
        let text = "kind: Pod\nmetadata:\n  name: a\n---\nkind: Pod\nmetadata:\n  name: b\n";
        let (out, _) = fix(text);
        assert_eq!(out.matches("---").count(), 1);
        let docs: Vec<Value> = serde_yaml::Deserializer::from_str(&out)
            .map(|d| Value::deserialize(d).expect("doc parses"))
            .collect();
        assert_eq!(docs.len(), 2);
    }
}
