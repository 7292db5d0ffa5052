//! Per-role metric descriptor tables

use serde::Serialize;

use crate::types::Role;

/// One dashboard metric: where its value comes from and where it links to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MetricDescriptor {
    /// Key in the home summary payload
    pub key: &'static str,

    /// Display label
    pub label: &'static str,

    /// Route the metric card opens
    pub link: &'static str,

    /// Value shown when the payload lacks the key
    pub default: u64,
}

const fn metric(key: &'static str, label: &'static str, link: &'static str) -> MetricDescriptor {
    MetricDescriptor {
        key,
        label,
        link,
        default: 0,
    }
}

static SUPER_ADMIN: [MetricDescriptor; 4] = [
    metric("total_schools", "Total Schools", "/schools"),
    metric("total_active_users", "Active Users", "/user-management"),
    metric("total_ebooks", "E-books", "/view-ebooks"),
    metric("pending_requests", "Pending Requests", "/admin-requests"),
];

static ADMIN: [MetricDescriptor; 4] = [
    metric("total_teachers", "Teachers", "/teachers"),
    metric("total_students", "Students", "/students"),
    metric("total_classes", "Classes", "/classes"),
    metric("pending_requests", "Pending Requests", "/requests"),
];

static TEACHER: [MetricDescriptor; 4] = [
    metric("total_classes", "My Classes", "/classes"),
    metric("total_students", "My Students", "/students"),
    metric("pending_requests", "Pending Requests", "/requests"),
    metric("total_ebooks", "E-books", "/view-ebooks"),
];

static STUDENT: [MetricDescriptor; 3] = [
    metric("total_subjects", "My Subjects", "/grades"),
    metric("total_ebooks", "E-books", "/view-ebooks"),
    metric("pending_requests", "Support Requests", "/support"),
];

/// Ordered descriptors for a role
pub fn descriptors(role: Role) -> &'static [MetricDescriptor] {
    match role {
        Role::SuperAdmin => &SUPER_ADMIN,
        Role::Admin => &ADMIN,
        Role::Teacher => &TEACHER,
        Role::Student => &STUDENT,
    }
}
