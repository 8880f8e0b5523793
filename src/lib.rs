//! シフト表（スプレッドシートの行×セル）から勤務時間と給与を計算する
//!
//! 計算本体（`shift_cell` → `timecard_data` → `wage` → `payroll`）は純粋関数で、
//! 入力を書き換えず、同じ入力には同じ結果を返す。

pub mod attendance;
pub mod cell_value;
pub mod config;
pub mod detail;
pub mod error;
pub mod export;
pub mod merge;
pub mod payroll;
pub mod period;
pub mod report;
pub mod server;
pub mod shift_cell;
pub mod timecard_data;
pub mod wage;

pub use attendance::{build_roster, AttendanceRoster, HourlySlots, RosterSheet};
pub use cell_value::CellValue;
pub use config::{RateOverrides, ServerConfig, StoreCatalog, StoreSettings};
pub use error::{PayrollError, Result};
pub use merge::{MergedEmployee, MergedPayroll, SheetPayroll};
pub use payroll::{calculate_payroll, EmployeeResult, PayrollConfig, PayrollResult, SheetTable};
pub use shift_cell::{ShiftCell, TimeSegment};
pub use timecard_data::{calculate_employee, EmployeeSchedule, EmployeeSummary};
pub use wage::{calculate_salary_from_breakdown, HoursBreakdown, PayRates};
