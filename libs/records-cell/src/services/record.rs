use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use appointment_cell::AppointmentAccess;
use shared_database::{ClinicStore, MediaFile, MediaStorage};
use shared_models::appointment::Appointment;
use shared_models::auth::Role;
use shared_models::doctor::Doctor;
use shared_models::record::{MedicalRecord, Medication, Prescription};
use shared_models::user::UserAccount;
use shared_utils::validation::non_empty;
use shared_utils::AppState;

use crate::models::{RecordError, RecordQuery, SavePrescriptionRequest, REPORT_FOLDER};

pub struct RecordService {
    store: Arc<dyn ClinicStore>,
    media: Arc<dyn MediaStorage>,
    access: AppointmentAccess,
}

impl RecordService {
    pub fn new(state: &AppState) -> Self {
        Self {
            store: state.store.clone(),
            media: state.media.clone(),
            access: AppointmentAccess::new(state.store.clone()),
        }
    }

    async fn doctor_profile(&self, doctor_user: &UserAccount) -> Result<Option<Doctor>, RecordError> {
        Ok(self.store.find_doctor_by_user(doctor_user.id).await?)
    }

    /// An appointment booked with this doctor. Anything else reads as missing.
    async fn owned_appointment(&self, doctor: &Doctor, appointment_id: Uuid) -> Result<Appointment, RecordError> {
        match self.store.find_appointment(appointment_id).await? {
            Some(appointment) if appointment.doctor_id == doctor.id => Ok(appointment),
            _ => Err(RecordError::AppointmentNotFound),
        }
    }

    fn validate_medications(medications: &[Medication]) -> Result<(), RecordError> {
        for (index, medication) in medications.iter().enumerate() {
            let fields = [&medication.name, &medication.dosage, &medication.frequency, &medication.duration];
            if fields.iter().any(|f| f.trim().is_empty()) {
                return Err(RecordError::Validation(format!(
                    "Medication {}: name, dosage, frequency and duration are required",
                    index + 1
                )));
            }
        }
        Ok(())
    }

    /// Writes the appointment's prescription and appends a visit snapshot.
    ///
    /// The prescription is replaced on every save; the medical record history
    /// keeps one entry per save.
    pub async fn save_prescription(
        &self,
        doctor_user: &UserAccount,
        request: SavePrescriptionRequest,
        now: DateTime<Utc>,
    ) -> Result<(Prescription, MedicalRecord), RecordError> {
        let doctor = self.doctor_profile(doctor_user).await?.ok_or(RecordError::AppointmentNotFound)?;
        let appointment = self.owned_appointment(&doctor, request.appointment_id).await?;

        let diagnosis = request.diagnosis.trim().to_string();
        if diagnosis.is_empty() {
            return Err(RecordError::Validation("Diagnosis is required".to_string()));
        }
        Self::validate_medications(&request.medications)?;
        let instructions = non_empty(request.instructions);

        let prescription = Prescription {
            id: Uuid::new_v4(),
            appointment_id: appointment.id,
            doctor_id: doctor.id,
            diagnosis: diagnosis.clone(),
            medications: request.medications,
            instructions: instructions.clone(),
            created_at: now,
            updated_at: now,
        };
        let record = MedicalRecord {
            id: Uuid::new_v4(),
            patient_id: appointment.patient_id,
            appointment_id: Some(appointment.id),
            visit_date: appointment.date,
            doctor_name: doctor_user.name.clone(),
            diagnosis,
            prescription: serde_json::to_string(&prescription.medications)?,
            notes: instructions,
            attachments: Vec::new(),
            created_at: now,
        };

        let (prescription, record) = self.store.save_prescription(prescription, record).await?;
        info!(
            "Prescription {} saved for appointment {} (record {})",
            prescription.id, appointment.id, record.id
        );
        Ok((prescription, record))
    }

    pub async fn get_prescription(&self, actor: &UserAccount, appointment_id: Uuid) -> Result<Prescription, RecordError> {
        let appointment = self.access.load_for(actor, appointment_id).await?;
        self.store
            .find_prescription(appointment.id)
            .await?
            .ok_or(RecordError::PrescriptionNotFound)
    }

    /// Patients read their own history; staff name the patient.
    pub async fn list_records(&self, actor: &UserAccount, query: RecordQuery) -> Result<Vec<MedicalRecord>, RecordError> {
        let patient_id = match actor.role {
            Role::Patient => actor.id,
            Role::Doctor | Role::Admin => query
                .patient_id
                .ok_or_else(|| RecordError::Validation("patient_id is required".to_string()))?,
        };

        let records = self.store.list_medical_records(patient_id).await?;
        debug!("Listed {} medical records for patient {}", records.len(), patient_id);
        Ok(records)
    }

    pub async fn add_attachment(
        &self,
        doctor_user: &UserAccount,
        record_id: Uuid,
        file: &str,
    ) -> Result<MedicalRecord, RecordError> {
        let record = self.store
            .find_medical_record(record_id)
            .await?
            .ok_or(RecordError::RecordNotFound)?;

        if let Some(appointment_id) = record.appointment_id {
            let doctor = self.doctor_profile(doctor_user).await?.ok_or(RecordError::RecordNotFound)?;
            if self.owned_appointment(&doctor, appointment_id).await.is_err() {
                warn!("Doctor {} tried to attach to record {}", doctor.id, record.id);
                return Err(RecordError::RecordNotFound);
            }
        }

        let file = MediaFile::from_data_uri(file)?;
        let stored = self.media.upload(file, REPORT_FOLDER).await?;
        let record = self.store.add_record_attachment(record.id, stored.url).await?;
        info!("Attachment added to medical record {}", record.id);
        Ok(record)
    }
}
