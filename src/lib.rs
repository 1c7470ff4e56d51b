//! sqlite-errlog - NGINX module routing SQLite's internal log into the nginx error log

mod bridge;
mod config;
mod domain;
mod file_logger;
mod logging;
mod nginx_helpers;
mod parsing;
mod sqlite_log;
mod types;

use config::MainConfig;
use ngx::ffi::{
    NGX_CONF_NOARGS, NGX_CONF_TAKE1, NGX_HTTP_LOC_CONF, NGX_HTTP_LOC_CONF_OFFSET,
    NGX_HTTP_MAIN_CONF, NGX_HTTP_MODULE, NGX_RS_MODULE_SIGNATURE,
    nginx_version, ngx_command_t, ngx_conf_t, ngx_http_module_t, ngx_int_t, ngx_module_t,
    ngx_str_t, ngx_uint_t,
};
use ngx::http::{HttpModule, HttpModuleLocationConf, HttpModuleMainConf, NgxHttpCoreModule};
use ngx::{core::Status, http, http_request_handler, ngx_log_debug_http, ngx_modules, ngx_string};
use std::os::raw::{c_char, c_void};
use std::ptr::addr_of;
use types::HostSeverity;

const NGX_CONF_ERROR: *mut c_char = usize::MAX as *mut c_char;

pub struct Module;

impl ngx::http::HttpModule for Module {
    fn module() -> &'static ngx_module_t {
        unsafe { &*addr_of!(ngx_http_sqlite_errlog_module) }
    }

    unsafe extern "C" fn postconfiguration(cf: *mut ngx_conf_t) -> ngx_int_t {
        let main_conf = match unsafe { Module::main_conf(&*cf) } {
            Some(conf) => conf,
            None => {
                logging::log_config_error(cf, "main configuration is missing");
                return Status::NGX_ERROR.into();
            }
        };

        let validated = match parsing::parse_config(main_conf) {
            Ok(validated) => validated,
            Err(e) => {
                logging::log_config_error(cf, &e);
                return Status::NGX_ERROR.into();
            }
        };

        match bridge::install(&validated) {
            Ok(report) => {
                for warning in &report.warnings {
                    logging::log_install_warning(cf, warning);
                }
                logging::log_installed(
                    cf,
                    validated.threshold.as_str(),
                    report.delegate_path.as_deref(),
                );
                Status::NGX_OK.into()
            }
            Err(e) => {
                logging::log_config_error(cf, &e);
                Status::NGX_ERROR.into()
            }
        }
    }
}

unsafe impl HttpModuleMainConf for Module {
    type MainConf = MainConfig;
}

#[unsafe(no_mangle)]
#[allow(non_upper_case_globals)]
static ngx_http_sqlite_errlog_module_ctx: ngx_http_module_t = ngx_http_module_t {
    preconfiguration: Some(Module::preconfiguration),
    postconfiguration: Some(Module::postconfiguration),
    create_main_conf: Some(Module::create_main_conf),
    init_main_conf: Some(Module::init_main_conf),
    create_srv_conf: None,
    merge_srv_conf: None,
    create_loc_conf: None,
    merge_loc_conf: None,
};

ngx_modules!(ngx_http_sqlite_errlog_module);

#[unsafe(no_mangle)]
#[allow(non_upper_case_globals)]
pub static mut ngx_http_sqlite_errlog_module: ngx_module_t = ngx_module_t {
    ctx_index: ngx_uint_t::MAX,
    index: ngx_uint_t::MAX,
    name: std::ptr::null_mut(),
    spare0: 0,
    spare1: 0,
    version: nginx_version as ngx_uint_t,
    signature: NGX_RS_MODULE_SIGNATURE.as_ptr() as *const c_char,

    ctx: &ngx_http_sqlite_errlog_module_ctx as *const _ as *mut _,
    commands: unsafe { &ngx_http_sqlite_errlog_commands[0] as *const _ as *mut _ },
    type_: NGX_HTTP_MODULE as ngx_uint_t,

    init_master: None,
    init_module: None,
    init_process: None,
    init_thread: None,
    exit_thread: None,
    exit_process: None,
    exit_master: None,

    spare_hook0: 0,
    spare_hook1: 0,
    spare_hook2: 0,
    spare_hook3: 0,
    spare_hook4: 0,
    spare_hook5: 0,
    spare_hook6: 0,
    spare_hook7: 0,
};

#[unsafe(no_mangle)]
#[allow(non_upper_case_globals)]
static mut ngx_http_sqlite_errlog_commands: [ngx_command_t; 6] = [
    ngx_command_t {
        name: ngx_string!("sqlite_log_level"),
        type_: (NGX_HTTP_MAIN_CONF | NGX_CONF_TAKE1) as ngx_uint_t,
        set: Some(ngx_http_sqlite_errlog_set_level),
        conf: 0,
        offset: 0,
        post: std::ptr::null_mut(),
    },
    ngx_command_t {
        name: ngx_string!("sqlite_log_tag"),
        type_: (NGX_HTTP_MAIN_CONF | NGX_CONF_TAKE1) as ngx_uint_t,
        set: Some(ngx_http_sqlite_errlog_set_tag),
        conf: 0,
        offset: 0,
        post: std::ptr::null_mut(),
    },
    ngx_command_t {
        name: ngx_string!("sqlite_log_file"),
        type_: (NGX_HTTP_MAIN_CONF | NGX_CONF_TAKE1) as ngx_uint_t,
        set: Some(ngx_http_sqlite_errlog_set_file),
        conf: 0,
        offset: 0,
        post: std::ptr::null_mut(),
    },
    ngx_command_t {
        name: ngx_string!("sqlite_log_file_level"),
        type_: (NGX_HTTP_MAIN_CONF | NGX_CONF_TAKE1) as ngx_uint_t,
        set: Some(ngx_http_sqlite_errlog_set_file_level),
        conf: 0,
        offset: 0,
        post: std::ptr::null_mut(),
    },
    ngx_command_t {
        name: ngx_string!("sqlite_log_status"),
        type_: (NGX_HTTP_LOC_CONF | NGX_CONF_NOARGS) as ngx_uint_t,
        set: Some(ngx_http_sqlite_errlog_set_status),
        conf: NGX_HTTP_LOC_CONF_OFFSET,
        offset: 0,
        post: std::ptr::null_mut(),
    },
    ngx_command_t {
        name: ngx_str_t {
            len: 0,
            data: std::ptr::null_mut(),
        },
        type_: 0,
        set: None,
        conf: 0,
        offset: 0,
        post: std::ptr::null_mut(),
    },
];

/// First directive argument as an owned string
unsafe fn first_arg(cf: *mut ngx_conf_t) -> String {
    unsafe {
        let args = (*(*cf).args).elts as *mut ngx_str_t;
        (*args.add(1)).to_string()
    }
}

/// Directive handler for sqlite_log_level
#[unsafe(no_mangle)]
extern "C" fn ngx_http_sqlite_errlog_set_level(
    cf: *mut ngx_conf_t,
    _cmd: *mut ngx_command_t,
    conf: *mut c_void,
) -> *mut c_char {
    unsafe {
        let conf = &mut *(conf as *mut MainConfig);
        conf.log_level = first_arg(cf);
    };

    std::ptr::null_mut()
}

/// Directive handler for sqlite_log_tag
#[unsafe(no_mangle)]
extern "C" fn ngx_http_sqlite_errlog_set_tag(
    cf: *mut ngx_conf_t,
    _cmd: *mut ngx_command_t,
    conf: *mut c_void,
) -> *mut c_char {
    unsafe {
        let conf = &mut *(conf as *mut MainConfig);
        conf.log_tag = first_arg(cf);
    };

    std::ptr::null_mut()
}

/// Directive handler for sqlite_log_file
#[unsafe(no_mangle)]
extern "C" fn ngx_http_sqlite_errlog_set_file(
    cf: *mut ngx_conf_t,
    _cmd: *mut ngx_command_t,
    conf: *mut c_void,
) -> *mut c_char {
    unsafe {
        let conf = &mut *(conf as *mut MainConfig);
        conf.log_file = first_arg(cf);
    };

    std::ptr::null_mut()
}

/// Directive handler for sqlite_log_file_level
#[unsafe(no_mangle)]
extern "C" fn ngx_http_sqlite_errlog_set_file_level(
    cf: *mut ngx_conf_t,
    _cmd: *mut ngx_command_t,
    conf: *mut c_void,
) -> *mut c_char {
    unsafe {
        let conf = &mut *(conf as *mut MainConfig);
        conf.log_file_level = first_arg(cf);
    };

    std::ptr::null_mut()
}

/// Directive handler for sqlite_log_status
#[unsafe(no_mangle)]
extern "C" fn ngx_http_sqlite_errlog_set_status(
    cf: *mut ngx_conf_t,
    _cmd: *mut ngx_command_t,
    _conf: *mut c_void,
) -> *mut c_char {
    // Set the content handler for this location
    match unsafe { NgxHttpCoreModule::location_conf_mut(&*cf) } {
        Some(clcf) => {
            clcf.handler = Some(sqlite_log_status_handler);
            std::ptr::null_mut()
        }
        None => NGX_CONF_ERROR,
    }
}

// HTTP request handler - reports the bridge state as JSON
http_request_handler!(sqlite_log_status_handler, |request: &mut http::Request| {
    ngx_log_debug_http!(request, "sqlite log status handler called");

    let reply = nginx_helpers::StatusReply::from_status(bridge::status().as_ref());
    match &reply {
        nginx_helpers::StatusReply::NotInstalled => logging::log(
            request,
            HostSeverity::Warning,
            "status",
            "log bridge is not installed",
        ),
        nginx_helpers::StatusReply::Failed(e) => {
            logging::log(request, HostSeverity::Error, "status", e)
        }
        nginx_helpers::StatusReply::Report(_) => {}
    }

    nginx_helpers::send_status_reply(request, &reply)
});
