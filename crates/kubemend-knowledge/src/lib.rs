#![doc = include_str!("../README.md")]

pub mod fields;
pub mod numbers;
pub mod typos;
pub mod wrapping;

pub use fields::{
    BOOLEAN_FIELDS, CHILD_VALUE_PARENTS, FORCED_INDENTS, FREEFORM_PARENTS, NUMERIC_FIELDS,
    is_boolean_field, is_numeric_field, matches_numeric_pattern,
};
pub use numbers::{BOOLEAN_STRINGS, boolean_for, compound_word_number, word_number};
pub use typos::{FIELD_TYPO_MAP, TOP_LEVEL_REWRITES, TYPO_CORRECTIONS};
pub use wrapping::{NESTED_STRUCTURE_PATTERNS, WrapPattern};

// -----------------------------------------------------------------------
// Canonical key dictionary
// -----------------------------------------------------------------------

/// Canonical Kubernetes manifest key names the fuzzy matcher corrects
/// toward. Covers the fields that appear in the workload, networking,
/// storage, and RBAC manifests people actually write by hand.
pub const KNOWN_KEYS: &[&str] = &[
    // Document roots
    "apiVersion",
    "kind",
    "metadata",
    "spec",
    "status",
    "data",
    "binaryData",
    "stringData",
    "type",
    "immutable",
    // metadata
    "name",
    "namespace",
    "labels",
    "annotations",
    "generateName",
    "finalizers",
    "ownerReferences",
    // workload spec
    "replicas",
    "selector",
    "matchLabels",
    "matchExpressions",
    "template",
    "strategy",
    "rollingUpdate",
    "maxSurge",
    "maxUnavailable",
    "minReadySeconds",
    "revisionHistoryLimit",
    "progressDeadlineSeconds",
    "serviceName",
    "podManagementPolicy",
    "updateStrategy",
    "volumeClaimTemplates",
    "paused",
    // pod spec
    "containers",
    "initContainers",
    "ephemeralContainers",
    "restartPolicy",
    "terminationGracePeriodSeconds",
    "activeDeadlineSeconds",
    "dnsPolicy",
    "nodeSelector",
    "serviceAccountName",
    "automountServiceAccountToken",
    "nodeName",
    "hostNetwork",
    "hostPID",
    "hostIPC",
    "shareProcessNamespace",
    "securityContext",
    "imagePullSecrets",
    "hostname",
    "subdomain",
    "affinity",
    "nodeAffinity",
    "podAffinity",
    "podAntiAffinity",
    "schedulerName",
    "tolerations",
    "hostAliases",
    "priorityClassName",
    "priority",
    "runtimeClassName",
    "enableServiceLinks",
    "preemptionPolicy",
    "topologySpreadConstraints",
    "hostUsers",
    "volumes",
    // container
    "image",
    "imagePullPolicy",
    "command",
    "args",
    "workingDir",
    "ports",
    "containerPort",
    "hostPort",
    "protocol",
    "env",
    "envFrom",
    "value",
    "valueFrom",
    "resources",
    "limits",
    "requests",
    "cpu",
    "memory",
    "volumeMounts",
    "mountPath",
    "subPath",
    "readOnly",
    "volumeDevices",
    "livenessProbe",
    "readinessProbe",
    "startupProbe",
    "lifecycle",
    "postStart",
    "preStop",
    "terminationMessagePath",
    "terminationMessagePolicy",
    "stdin",
    "stdinOnce",
    "tty",
    // probes and handlers
    "httpGet",
    "tcpSocket",
    "exec",
    "grpc",
    "path",
    "port",
    "scheme",
    "host",
    "httpHeaders",
    "initialDelaySeconds",
    "periodSeconds",
    "timeoutSeconds",
    "successThreshold",
    "failureThreshold",
    "terminationGracePeriod",
    // env sources
    "configMapKeyRef",
    "secretKeyRef",
    "fieldRef",
    "resourceFieldRef",
    "configMapRef",
    "secretRef",
    "fieldPath",
    "key",
    "optional",
    "prefix",
    // security context
    "runAsUser",
    "runAsGroup",
    "runAsNonRoot",
    "fsGroup",
    "privileged",
    "allowPrivilegeEscalation",
    "readOnlyRootFilesystem",
    "capabilities",
    "add",
    "drop",
    "seccompProfile",
    "supplementalGroups",
    // volumes
    "configMap",
    "secret",
    "persistentVolumeClaim",
    "claimName",
    "emptyDir",
    "medium",
    "sizeLimit",
    "hostPath",
    "nfs",
    "server",
    "downwardAPI",
    "projected",
    "items",
    "secretName",
    "defaultMode",
    // service
    "clusterIP",
    "externalName",
    "sessionAffinity",
    "targetPort",
    "nodePort",
    "externalTrafficPolicy",
    "loadBalancerIP",
    "ipFamilies",
    // ingress
    "rules",
    "http",
    "paths",
    "pathType",
    "backend",
    "service",
    "number",
    "ingressClassName",
    "tls",
    "hosts",
    // batch
    "schedule",
    "concurrencyPolicy",
    "suspend",
    "jobTemplate",
    "startingDeadlineSeconds",
    "successfulJobsHistoryLimit",
    "failedJobsHistoryLimit",
    "backoffLimit",
    "completions",
    "parallelism",
    "ttlSecondsAfterFinished",
    "completionMode",
    // storage
    "accessModes",
    "storageClassName",
    "storage",
    "volumeMode",
    "persistentVolumeReclaimPolicy",
    "capacity",
    "volumeName",
    // RBAC
    "subjects",
    "roleRef",
    "apiGroup",
    "apiGroups",
    "verbs",
    "resourceNames",
    // network policy
    "podSelector",
    "policyTypes",
    "ingress",
    "egress",
    "from",
    "to",
    "ipBlock",
    "cidr",
    "except",
    "namespaceSelector",
    // autoscaling
    "scaleTargetRef",
    "minReplicas",
    "maxReplicas",
    "targetCPUUtilizationPercentage",
    "metrics",
    // scheduling expressions
    "weight",
    "preference",
    "operator",
    "values",
    "effect",
    "tolerationSeconds",
    "requiredDuringSchedulingIgnoredDuringExecution",
    "preferredDuringSchedulingIgnoredDuringExecution",
    "nodeSelectorTerms",
    "topologyKey",
];

/// Canonical Kind names, used to repair the right-hand side of `kind:`.
pub const KNOWN_KINDS: &[&str] = &[
    "Pod",
    "Deployment",
    "StatefulSet",
    "DaemonSet",
    "ReplicaSet",
    "Job",
    "CronJob",
    "Service",
    "ConfigMap",
    "Secret",
    "Ingress",
    "Namespace",
    "ServiceAccount",
    "Role",
    "RoleBinding",
    "ClusterRole",
    "ClusterRoleBinding",
    "PersistentVolume",
    "PersistentVolumeClaim",
    "StorageClass",
    "NetworkPolicy",
    "HorizontalPodAutoscaler",
    "PodDisruptionBudget",
    "LimitRange",
    "ResourceQuota",
    "Endpoints",
    "EndpointSlice",
];

/// Keys that typically introduce a child mapping or sequence. A bare
/// occurrence of one of these followed by a deeper-indented block is very
/// likely a parent missing its colon.
pub const PARENT_KEYWORDS: &[&str] = &[
    "metadata",
    "spec",
    "status",
    "selector",
    "matchLabels",
    "matchExpressions",
    "template",
    "strategy",
    "rollingUpdate",
    "updateStrategy",
    "containers",
    "initContainers",
    "resources",
    "limits",
    "requests",
    "env",
    "envFrom",
    "ports",
    "volumeMounts",
    "volumes",
    "labels",
    "annotations",
    "data",
    "stringData",
    "livenessProbe",
    "readinessProbe",
    "startupProbe",
    "httpGet",
    "tcpSocket",
    "exec",
    "grpc",
    "lifecycle",
    "postStart",
    "preStop",
    "securityContext",
    "capabilities",
    "affinity",
    "nodeAffinity",
    "podAffinity",
    "podAntiAffinity",
    "nodeSelector",
    "tolerations",
    "valueFrom",
    "configMapKeyRef",
    "secretKeyRef",
    "fieldRef",
    "resourceFieldRef",
    "configMapRef",
    "secretRef",
    "configMap",
    "secret",
    "persistentVolumeClaim",
    "emptyDir",
    "hostPath",
    "rules",
    "http",
    "paths",
    "backend",
    "service",
    "tls",
    "jobTemplate",
    "volumeClaimTemplates",
    "scaleTargetRef",
    "roleRef",
    "podSelector",
    "ipBlock",
    "preference",
    "httpHeaders",
];

/// Fields permitted at the root of a manifest document. Anything else
/// found at indent zero is a typo, a stray the AST pass hoists under
/// `metadata` or `spec`, or junk it removes outright.
pub const VALID_TOP_LEVEL_FIELDS: &[&str] = &[
    "apiVersion",
    "kind",
    "metadata",
    "spec",
    "status",
    "data",
    "binaryData",
    "stringData",
    "type",
    "immutable",
    "subjects",
    "roleRef",
    "rules",
    "aggregationRule",
    "webhooks",
    "secrets",
    "imagePullSecrets",
    "automountServiceAccountToken",
    "provisioner",
    "parameters",
    "reclaimPolicy",
    "volumeBindingMode",
    "allowVolumeExpansion",
    "allowedTopologies",
    "mountOptions",
];

/// `true` when `field` may appear at the root of a manifest document.
pub fn is_valid_top_level_field(field: &str) -> bool {
    VALID_TOP_LEVEL_FIELDS.contains(&field)
}

/// `true` when `key` is one of the canonical key names.
pub fn is_known_key(key: &str) -> bool {
    KNOWN_KEYS.contains(&key)
}

/// `true` when `word` typically introduces a child block.
pub fn is_parent_keyword(word: &str) -> bool {
    PARENT_KEYWORDS.contains(&word)
}
