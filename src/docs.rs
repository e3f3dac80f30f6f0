use crate::api::employee::{CreateEmployee, EmployeeListResponse, EmployeeQuery};
use crate::api::leave_admin::{
    AllocateRequest, AllocationEntry, AllocationError, AllocationReportQuery, AllocationResponse,
    AllocationStatus, ResetEntry, ResetRequest,
};
use crate::api::leave_balance::{BalanceEntry, BalanceQuery, BalanceResponse};
use crate::api::leave_request::{CreateLeave, LeaveFilter, LeaveListResponse, MyLeaveFilter};
use crate::api::settings::UpdateSettings;
use crate::model::employee::Employee;
use crate::model::leave_balance::LeaveBalance;
use crate::model::leave_request::LeaveRequest;
use crate::model::leave_type::LeaveType;
use crate::model::tenant_settings::TenantSettings;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Zenora HR API",
        version = "1.0.0",
        description = r#"
## Zenora — multi-tenant HR operations backend

This API powers the leave subsystem of a multi-tenant HR platform.

### Key Features
- **Leave Requests**
  - Apply with business-day counting, notice and balance checks, overlap detection
  - Manager/HR approval with transactional balance charging
- **Leave Balances**
  - Per (employee, type, year) balances with org-policy defaults
  - Admin batch allocation with proration and capped carry-forward
  - Explicit balance reset as the data-repair tool
- **Tenant Settings**
  - Per-tenant leave policies, notice rules, carry-forward caps
- **Employee Management**
  - Tenant-scoped employee records with manager chains

### Security
All endpoints under the API prefix require **JWT Bearer authentication**.
Claims carry the tenant; every query is tenant-scoped.

### Response Format
JSON envelopes of the form `{ "success": boolean, ... }`.

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::api::leave_balance::get_balances,

        crate::api::leave_request::create_leave,
        crate::api::leave_request::my_leave_list,
        crate::api::leave_request::withdraw_leave,
        crate::api::leave_request::leave_list,
        crate::api::leave_request::get_leave,
        crate::api::leave_request::approve_leave,
        crate::api::leave_request::reject_leave,

        crate::api::leave_admin::allocate_leave,
        crate::api::leave_admin::allocation_report,
        crate::api::leave_admin::reset_balance,

        crate::api::settings::get_settings,
        crate::api::settings::update_settings,

        crate::api::employee::create_employee,
        crate::api::employee::get_employee,
        crate::api::employee::list_employees,
        crate::api::employee::update_employee,
        crate::api::employee::delete_employee
    ),
    components(
        schemas(
            LeaveType,
            LeaveRequest,
            LeaveBalance,
            TenantSettings,
            BalanceQuery,
            BalanceEntry,
            BalanceResponse,
            CreateLeave,
            MyLeaveFilter,
            LeaveFilter,
            LeaveListResponse,
            AllocateRequest,
            AllocationEntry,
            AllocationError,
            AllocationResponse,
            AllocationReportQuery,
            AllocationStatus,
            ResetRequest,
            ResetEntry,
            UpdateSettings,
            CreateEmployee,
            EmployeeQuery,
            Employee,
            EmployeeListResponse
        )
    ),
    tags(
        (name = "Leave", description = "Leave request workflow"),
        (name = "Leave Balance", description = "Employee balance views"),
        (name = "Leave Admin", description = "Allocation batches and balance repair"),
        (name = "Settings", description = "Tenant policy settings"),
        (name = "Employee", description = "Employee management APIs"),
    )
)]
pub struct ApiDoc;
