//! Command-line argument generation for llama-server.

use llamadeck_core::{FlashAttention, ServerConfig};

/// Sentinel meaning "let llama-server pick" for signed numeric options.
const AUTO: i64 = -1;

/// Turn a [`ServerConfig`] into the ordered argument list for llama-server.
///
/// Only fields that are set produce arguments. The order is fixed: model
/// selection, `--host`/`--port`, resource limits, sampling, KV cache types,
/// bare flags, then `extra_args` verbatim.
pub fn build_args(config: &ServerConfig) -> Vec<String> {
    let mut args = Vec::new();

    if let Some(model) = &config.model_path {
        push_pair(&mut args, "-m", model.display());
    } else if let Some(dir) = &config.models_dir {
        push_pair(&mut args, "--models-dir", dir.display());
    }

    push_pair(&mut args, "--host", &config.host);
    push_pair(&mut args, "--port", config.port);

    // Resource limits
    push_opt(&mut args, "-c", config.ctx_size);
    push_opt(&mut args, "-b", config.batch_size);
    push_opt(&mut args, "--ubatch-size", config.ubatch_size);
    push_auto(&mut args, "-t", config.threads.map(i64::from));
    push_auto(&mut args, "--threads-batch", config.threads_batch.map(i64::from));
    push_auto(&mut args, "-ngl", config.gpu_layers.map(i64::from));
    push_opt(&mut args, "-mg", config.main_gpu.filter(|gpu| *gpu != 0));
    match config.flash_attn {
        Some(FlashAttention::On) => args.push("-fa".to_string()),
        Some(FlashAttention::Off) => args.push("--no-flash-attn".to_string()),
        Some(FlashAttention::Auto) | None => {}
    }

    // Sampling
    push_opt(&mut args, "--temp", config.temperature);
    push_opt(&mut args, "--top-k", config.top_k);
    push_opt(&mut args, "--top-p", config.top_p);
    push_opt(&mut args, "--repeat-penalty", config.repeat_penalty);
    push_auto(&mut args, "-n", config.n_predict.map(i64::from));
    push_auto(&mut args, "--seed", config.seed);

    push_opt(&mut args, "--cache-type-k", config.cache_type_k.as_deref());
    push_opt(&mut args, "--cache-type-v", config.cache_type_v.as_deref());

    push_flag(&mut args, "--embedding", config.embedding);
    push_flag(&mut args, "--verbose", config.verbose);
    push_flag(&mut args, "--penalize-nl", config.penalize_nl);
    push_flag(&mut args, "--ignore-eos", config.ignore_eos);
    push_flag(&mut args, "--mlock", config.mlock);
    push_flag(&mut args, "--numa", config.numa);
    if config.use_mmap == Some(false) {
        args.push("--no-mmap".to_string());
    }

    args.extend(config.extra_args.iter().cloned());
    args
}

fn push_pair(args: &mut Vec<String>, flag: &str, value: impl ToString) {
    args.push(flag.to_string());
    args.push(value.to_string());
}

fn push_opt<T: ToString>(args: &mut Vec<String>, flag: &str, value: Option<T>) {
    if let Some(value) = value {
        push_pair(args, flag, value);
    }
}

fn push_auto(args: &mut Vec<String>, flag: &str, value: Option<i64>) {
    push_opt(args, flag, value.filter(|v| *v != AUTO));
}

fn push_flag(args: &mut Vec<String>, flag: &str, enabled: Option<bool>) {
    if enabled == Some(true) {
        args.push(flag.to_string());
    }
}
