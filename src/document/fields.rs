// Known dstack top-level fields: canonical ordering, quick-add defaults and
// form control metadata.

use serde_yaml::{Mapping, Value};

/// Canonical position of known top-level keys. Keys outside this table are
/// always appended after all ordered keys, in original relative order.
pub const FIELD_ORDER: &[&str] = &[
    "type",
    "name",
    "python",
    "nvcc",
    "image",
    "working_dir",
    "commands",
    "env",
    "ports",
    "resources",
    "volumes",
    "backends",
    "regions",
    "nodes",
    "replicas",
    "spot_policy",
    "retry_policy",
    "max_price",
    "max_duration",
    "idle_duration",
];

pub fn field_position(name: &str) -> Option<usize> {
    FIELD_ORDER.iter().position(|f| *f == name)
}

/// Default value inserted when a known field is added back through quick-add.
pub fn default_value(name: &str) -> Option<Value> {
    let value = match name {
        "type" => Value::String("task".into()),
        "name" => Value::String("my-config".into()),
        "python" => Value::String("3.11".into()),
        "nvcc" => Value::Bool(true),
        "image" => Value::String("dstackai/base:py3.11-0.4.2".into()),
        "working_dir" => Value::String("/workspace".into()),
        "commands" => string_seq(&["pip install -r requirements.txt"]),
        "env" => string_seq(&["MODEL_NAME=meta-llama/Llama-2-7b"]),
        "ports" => Value::Sequence(vec![Value::Number(8000.into())]),
        "resources" => {
            let mut map = Mapping::new();
            map.insert("gpu".into(), Value::String("24GB".into()));
            map.insert("memory".into(), Value::String("16GB".into()));
            map.insert("cpu".into(), Value::Number(4.into()));
            Value::Mapping(map)
        }
        "volumes" => string_seq(&["/data:/workspace/data:rw"]),
        "backends" => string_seq(&["aws", "gcp"]),
        "regions" => string_seq(&["us-east-1", "us-west-2"]),
        "nodes" => Value::Number(1.into()),
        "replicas" => Value::Number(1.into()),
        "spot_policy" => Value::String("auto".into()),
        "retry_policy" => Value::String("on-failure".into()),
        "max_price" => Value::String("$2.50".into()),
        "max_duration" => Value::String("6h".into()),
        "idle_duration" => Value::String("10m".into()),
        _ => return None,
    };
    Some(value)
}

fn string_seq(items: &[&str]) -> Value {
    Value::Sequence(items.iter().map(|s| Value::String((*s).to_string())).collect())
}

/// Enumerated options for keys rendered as a select control.
pub fn select_options(key: &str) -> Option<&'static [&'static str]> {
    let options: &[&str] = match key {
        "type" => &["task", "service", "dev-environment"],
        "python" => &["3.8", "3.9", "3.10", "3.11", "3.12"],
        "ide" => &["vscode", "jupyter", "ssh"],
        "spot_policy" => &["auto", "spot", "on-demand"],
        "retry_policy" => &["never", "on-failure", "always"],
        "format" => &["openai", "tgi", "vllm"],
        _ => return None,
    };
    Some(options)
}

pub fn placeholder(key: &str) -> Option<&'static str> {
    let text = match key {
        "name" => "my-awesome-project",
        "gpu" => "e.g., 24GB, 80GB:8, or A100",
        "memory" => "e.g., 8GB, 16GB, 32GB",
        "disk" => "e.g., 50GB, 100GB, 1TB",
        "cpu" => "e.g., 2, 4, 8",
        "max_price" => "e.g., $1.00, $5.50",
        "max_duration" => "e.g., 1h, 30m, 2d",
        "idle_duration" => "e.g., 5m, 15m, 1h",
        "working_dir" => "/workspace",
        "image" => "ubuntu:20.04 or dstackai/base:py3.11-0.4.2",
        "model" => "meta-llama/Meta-Llama-3.1-8B-Instruct",
        "shm_size" => "2GB",
        _ => return None,
    };
    Some(text)
}

pub fn help_text(key: &str) -> Option<&'static str> {
    let text = match key {
        "type" => "The type of workload: task (batch job), service (long-running), or dev-environment (interactive)",
        "name" => "A unique identifier for your configuration. Use descriptive names for easy identification",
        "python" => "Python version to use in your environment. Choose based on your dependencies",
        "image" => "Docker image to use as base environment. Can be from Docker Hub or custom registries",
        "working_dir" => "Directory where commands will be executed. Defaults to /workspace if not specified",
        "commands" => "List of shell commands to execute sequentially. Each command runs in the same environment",
        "env" => "Environment variables available to your commands. Use KEY=value format or just KEY for secrets",
        "ports" => "Network ports to expose for services. Required for web applications and APIs",
        "resources" => "Hardware requirements for your workload. Specify GPU, memory, CPU, and disk needs",
        "gpu" => "GPU memory requirement. Can specify exact amount, range, or GPU type",
        "memory" => "System RAM requirement. Higher memory needed for large datasets and models",
        "cpu" => "Number of CPU cores. More cores help with parallel processing and data loading",
        "disk" => "Storage space for datasets, models, and temporary files",
        "shm_size" => "Shared memory size for data loading and inter-process communication",
        "volumes" => "Mount external storage or bind local directories. Format: source:destination:mode",
        "backends" => "Cloud providers to use for running your workload. Multiple backends provide fallback options",
        "regions" => "Specific regions within cloud providers. Closer regions reduce latency and costs",
        "nodes" => "Number of compute nodes for distributed workloads. Use for multi-GPU training",
        "replicas" => "Number of service replicas for load balancing. Can specify exact count or range",
        "spot_policy" => "Cost optimization strategy. Spot instances are cheaper but can be interrupted",
        "retry_policy" => "When to restart failed jobs. Useful for handling transient failures",
        "max_price" => "Maximum hourly cost limit. Helps control cloud spending and avoid surprises",
        "max_duration" => "Maximum runtime before automatic termination. Prevents runaway jobs",
        "idle_duration" => "Auto-terminate after period of inactivity. Saves costs on idle resources",
        "model" => "Pre-trained model identifier from Hugging Face or other model hubs",
        "format" => "API format for model serving. Different formats offer various features and compatibility",
        "ide" => "Development environment for interactive work. Choose based on your workflow preferences",
        "port" => "Network port number for service communication. Must be unique per service",
        _ => return None,
    };
    Some(text)
}

/// Template value appended when the UI adds an item to a known array field.
pub fn array_item_template(parent_path: &str) -> Value {
    match parent_path {
        "commands" => Value::String("python script.py".into()),
        "env" => Value::String("KEY=value".into()),
        "ports" => Value::Number(8080.into()),
        "rate_limits" => {
            let mut map = Mapping::new();
            map.insert("prefix".into(), Value::String("/api/".into()));
            map.insert("rps".into(), Value::Number(10.into()));
            Value::Mapping(map)
        }
        _ => Value::String("new_item".into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_order_positions() {
        assert_eq!(field_position("type"), Some(0));
        assert!(field_position("env") < field_position("ports"));
        assert_eq!(field_position("custom_key"), None);
    }

    #[test]
    fn test_known_fields_have_defaults() {
        for field in FIELD_ORDER {
            assert!(default_value(field).is_some(), "missing default for {field}");
        }
    }

    #[test]
    fn test_select_options_cover_type() {
        assert_eq!(
            select_options("type"),
            Some(["task", "service", "dev-environment"].as_slice())
        );
        assert!(select_options("image").is_none());
    }
}
